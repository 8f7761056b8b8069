//! Nonlinear diffusion: the explicit update step, Perona-Malik conductivity and
//! coefficient forwarding.

use crate::kernel::preprocess::scharr_taps;
use crate::ops::linear::Difference;
use crate::ops::{Plane, Precision, Taps, WindowOp};
use crate::pixel::Pixel;
use crate::util::math::signed_shift_right;
use crate::util::Normalization;

/// Fraction bits of the step size.
const STEP_FRACTION_BITS: u32 = 16;
/// Significant bits of the contrast square; its top bit is never set.
const CSQUARE_BITS: u32 = 31;
/// Fraction bits of the high-precision quotient before output scaling.
const QUOTIENT_BITS: u32 = 24;
/// Denominator and quotient widths of the standard precision.
const STANDARD_DEN_BITS: u32 = 18;
const STANDARD_RESULT_BITS: u32 = 14;
/// Shift normalizing one 3x3 Scharr pass (absolute weight sum 32).
const SCHARR_SHIFT: u32 = 5;

/// Converts a contrast factor in `[0, 1)` of full scale to the 0.32 fixed-point
/// square expected by [`Operator::Conductivity`](super::Operator::Conductivity).
pub fn contrast_square(contrast: f64) -> u32 {
    let square = (contrast * contrast).clamp(0.0, 1.0);
    (square * 4_294_967_296.0).min(u32::MAX as f64) as u32
}

/// `L + (step/2) * (flux_right - flux_left + flux_down - flux_up)`.
///
/// Each flux is the sum of two neighboring conductivities times the forward
/// difference of `L` between them. The result is clamped to `[0, max]`.
pub(crate) struct Diffusion {
    pub(crate) step: u32,
    pub(crate) bits: u32,
    pub(crate) max: i64,
}

impl<T: Pixel> WindowOp<T> for Diffusion {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let r = taps.radius();
        let c = |y: usize, x: usize| taps.secondary_at(y, x);
        let l = |y: usize, x: usize| taps.at(y, x);

        let cc = c(r, r);
        let lc = l(r, r);
        let x_pos = (c(r, r + 1) + cc) * (l(r, r + 1) - lc);
        let x_neg = (cc + c(r, r - 1)) * (lc - l(r, r - 1));
        let y_pos = (c(r + 1, r) + cc) * (l(r + 1, r) - lc);
        let y_neg = (cc + c(r - 1, r)) * (lc - l(r - 1, r));
        let diff = x_pos - x_neg + y_pos - y_neg;

        let diff_shift = 2 * self.bits as i32 - STEP_FRACTION_BITS as i32;
        let update_shift = 2 * STEP_FRACTION_BITS as i32 - self.bits as i32;
        let half_step = (self.step >> 1) as i64;
        let update = signed_shift_right(half_step * signed_shift_right(diff, diff_shift), update_shift);
        (lc + update).clamp(0, self.max)
    }
}

/// Rescales a value with `from` significant bits to `to` bits.
fn rescale(value: i64, from: u32, to: u32) -> i64 {
    signed_shift_right(value, from as i32 - to as i32)
}

/// Perona-Malik `k^2 / (k^2 + |grad L|^2)` in fixed point.
///
/// Gradients come from an internal Scharr pass normalized by 32, so their
/// squares carry `2 * bits - 1` significant bits. Numerator and denominator
/// terms are rescaled to the widths of the selected [`Precision`]; the `+1` in
/// the denominator keeps the quotient finite for a zero contrast factor.
pub(crate) struct Conductivity {
    contrast_square: u32,
    bits: u32,
    precision: Precision,
    dx: Difference,
    dy: Difference,
}

impl Conductivity {
    pub(crate) fn new(contrast_square: u32, bits: u32, precision: Precision) -> Self {
        let (x, y) = scharr_taps();
        let norm = Normalization::shift_only(SCHARR_SHIFT);
        Self {
            contrast_square,
            bits,
            precision,
            dx: Difference::horizontal(&x, 3, norm),
            dy: Difference::vertical(&y, 3, norm),
        }
    }
}

impl<T: Pixel> WindowOp<T> for Conductivity {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let lx = WindowOp::<T>::compute(&self.dx, taps);
        let ly = WindowOp::<T>::compute(&self.dy, taps);
        let (lxs, lys) = (lx * lx, ly * ly);
        let square_bits = 2 * self.bits - 1;
        let csq = self.contrast_square as i64;
        let wide = self.bits >= 16;

        match self.precision {
            Precision::LowPower => {
                let num_bits = if wide { CSQUARE_BITS } else { 19 };
                let den_bits = if wide { 17 } else { self.bits + 4 } - 1;
                let result_bits = if wide { self.bits - 1 } else { self.bits };
                // Gradient squares are only ever narrowed here.
                let narrow = |square: i64| rescale(square, square_bits, den_bits.min(square_bits));
                let num = rescale(csq, CSQUARE_BITS, num_bits);
                let den = 1 + rescale(csq, CSQUARE_BITS, den_bits) + narrow(lxs) + narrow(lys);
                rescale(num / den, result_bits, self.bits)
            }
            Precision::Standard => {
                let den_bits = STANDARD_DEN_BITS - 1;
                let den = 1
                    + rescale(csq, CSQUARE_BITS, den_bits)
                    + rescale(lxs, square_bits, den_bits)
                    + rescale(lys, square_bits, den_bits);
                rescale(csq / den, STANDARD_RESULT_BITS, self.bits)
            }
            Precision::High => {
                let den_bits = if wide { QUOTIENT_BITS - 1 } else { 15 };
                let num = csq << (den_bits + QUOTIENT_BITS - CSQUARE_BITS);
                let den = 1
                    + rescale(csq, CSQUARE_BITS, den_bits)
                    + rescale(lxs, square_bits, den_bits)
                    + rescale(lys, square_bits, den_bits);
                (num / den) >> (QUOTIENT_BITS - self.bits)
            }
        }
    }
}

/// Center tap of one input plane.
pub(crate) struct Forward {
    pub(crate) plane: Plane,
}

impl<T: Pixel> WindowOp<T> for Forward {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        taps.center(self.plane)
    }
}
