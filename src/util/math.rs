//! Fixed-point helpers shared by kernel preprocessing and the operators.

use crate::util::{FilterError, FilterResult};

/// Shift used to form the reciprocal of a non power-of-two weight sum.
const MAX_SHIFT: u32 = 48;
/// Number of significant bits kept in the reciprocal multiplier.
const MULT_BITS: u32 = 16;

/// Integer `(multiplier, shift)` pair approximating division by a weight sum.
///
/// Applying the pair computes `(value * mult + 2^(shift-1)) >> shift`, which
/// rounds half up. The shift is arithmetic, so negative values round toward
/// positive infinity at exact halves as well.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Normalization {
    /// Multiplier, at most 16 significant bits.
    pub mult: u64,
    /// Right shift applied after multiplication.
    pub shift: u32,
}

impl Normalization {
    /// Pair that leaves values unchanged.
    pub const IDENTITY: Normalization = Normalization { mult: 1, shift: 0 };

    /// Derives the pair for division by `sum`.
    ///
    /// Powers of two become a pure shift. Other sums use `2^48 / sum`
    /// truncated to its 16 most significant bits.
    pub fn from_sum(sum: u64) -> FilterResult<Self> {
        if sum == 0 {
            return Err(FilterError::DegenerateKernel {
                reason: "kernel weight sum is zero",
            });
        }
        if sum.is_power_of_two() {
            return Ok(Self {
                mult: 1,
                shift: sum.trailing_zeros(),
            });
        }
        let reciprocal = (1u64 << MAX_SHIFT) / sum;
        if reciprocal == 0 {
            return Err(FilterError::DegenerateKernel {
                reason: "kernel weight sum exceeds normalization range",
            });
        }
        let msb = 63 - reciprocal.leading_zeros();
        if msb >= MULT_BITS {
            let drop = msb - (MULT_BITS - 1);
            Ok(Self {
                mult: reciprocal >> drop,
                shift: MAX_SHIFT - drop,
            })
        } else {
            Ok(Self {
                mult: reciprocal,
                shift: MAX_SHIFT,
            })
        }
    }

    /// Pair for an explicit right shift with unit multiplier.
    pub fn shift_only(shift: u32) -> Self {
        Self { mult: 1, shift }
    }

    /// Applies the pair with round-half-up.
    #[inline]
    pub fn apply(&self, value: i64) -> i64 {
        let rounding: i128 = if self.shift > 0 {
            1i128 << (self.shift - 1)
        } else {
            0
        };
        let scaled = value as i128 * self.mult as i128 + rounding;
        (scaled >> self.shift) as i64
    }
}

/// Arithmetic right shift that also accepts negative shift amounts.
#[inline]
pub(crate) fn signed_shift_right(value: i64, shift: i32) -> i64 {
    if shift >= 0 {
        value >> shift.min(63)
    } else {
        value << (-shift).min(63)
    }
}

#[cfg(test)]
mod tests {
    use super::{signed_shift_right, Normalization};
    use crate::util::FilterError;

    #[test]
    fn power_of_two_sums_use_pure_shift() {
        assert_eq!(
            Normalization::from_sum(16).unwrap(),
            Normalization { mult: 1, shift: 4 }
        );
        assert_eq!(
            Normalization::from_sum(1).unwrap(),
            Normalization { mult: 1, shift: 0 }
        );
    }

    #[test]
    fn nine_tap_box_pair_matches_reference() {
        let norm = Normalization::from_sum(9).unwrap();
        assert_eq!(norm, Normalization { mult: 58254, shift: 19 });
        assert_eq!(norm.apply(9 * 200), 200);
        assert_eq!(norm.apply(0), 0);
    }

    #[test]
    fn zero_sum_is_rejected() {
        let err = Normalization::from_sum(0).err().unwrap();
        assert!(matches!(err, FilterError::DegenerateKernel { .. }));
    }

    #[test]
    fn apply_rounds_half_up_for_signed_values() {
        let norm = Normalization::shift_only(1);
        assert_eq!(norm.apply(3), 2);
        assert_eq!(norm.apply(-3), -1);
        assert_eq!(Normalization::IDENTITY.apply(-7), -7);
    }

    #[test]
    fn reciprocal_stays_within_sixteen_bits() {
        for sum in [3u64, 5, 7, 9, 25, 49, 81, 121, 1000, 65535] {
            let norm = Normalization::from_sum(sum).unwrap();
            assert!(norm.mult < (1 << 16), "sum {sum}: mult {}", norm.mult);
            let approx = norm.apply(sum as i64 * 100);
            assert!((approx - 100).abs() <= 1, "sum {sum}: {approx}");
        }
    }

    #[test]
    fn signed_shift_handles_both_directions() {
        assert_eq!(signed_shift_right(-16, 2), -4);
        assert_eq!(signed_shift_right(3, -2), 12);
    }
}
