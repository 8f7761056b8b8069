//! Scalar pixel types accepted by the engine.
//!
//! Operators compute in `i64` and hand their result back to the driver, which
//! narrows it to the output type with a caller-selected [`Conversion`].

use std::fmt::Debug;

/// Narrowing policy applied when an `i64` result is stored in a pixel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Conversion {
    /// Keep the low bits (two's complement truncation).
    #[default]
    Wrap,
    /// Clamp to the representable range.
    Saturate,
}

/// Fixed-width integer pixel.
pub trait Pixel: Copy + Default + Ord + Debug + Send + Sync + 'static {
    /// Bit width of the scalar.
    const BITS: u32;
    /// Whether the scalar is signed.
    const SIGNED: bool;
    /// Smallest representable value.
    const MIN: Self;
    /// Largest representable value.
    const MAX: Self;

    /// Widens to `i64` without loss.
    fn to_i64(self) -> i64;

    /// Narrows by truncating to the low bits.
    fn wrapping_from_i64(value: i64) -> Self;

    /// Narrows by clamping to `[MIN, MAX]`.
    fn saturating_from_i64(value: i64) -> Self;

    /// Narrows with the requested policy.
    #[inline]
    fn from_i64(value: i64, conversion: Conversion) -> Self {
        match conversion {
            Conversion::Wrap => Self::wrapping_from_i64(value),
            Conversion::Saturate => Self::saturating_from_i64(value),
        }
    }

    /// `MIN` widened to `i64`.
    #[inline]
    fn min_i64() -> i64 {
        Self::MIN.to_i64()
    }

    /// `MAX` widened to `i64`.
    #[inline]
    fn max_i64() -> i64 {
        Self::MAX.to_i64()
    }
}

macro_rules! impl_pixel {
    ($($ty:ty => $signed:expr),+ $(,)?) => {
        $(
            impl Pixel for $ty {
                const BITS: u32 = <$ty>::BITS;
                const SIGNED: bool = $signed;
                const MIN: Self = <$ty>::MIN;
                const MAX: Self = <$ty>::MAX;

                #[inline]
                fn to_i64(self) -> i64 {
                    self as i64
                }

                #[inline]
                fn wrapping_from_i64(value: i64) -> Self {
                    value as $ty
                }

                #[inline]
                fn saturating_from_i64(value: i64) -> Self {
                    value.clamp(<$ty>::MIN as i64, <$ty>::MAX as i64) as $ty
                }
            }
        )+
    };
}

impl_pixel!(
    u8 => false,
    u16 => false,
    u32 => false,
    i8 => true,
    i16 => true,
    i32 => true,
);
