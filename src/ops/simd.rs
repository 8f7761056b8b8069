//! Lane-parallel weighted sums using the `wide` crate.
//!
//! With eight lanes per step, every tap of the kernel is a contiguous run of
//! eight window columns, so one `i32x8` multiply-add covers all lanes. The
//! path is only taken for pixels of at most 8 bits, where the widest sum
//! (121 taps of 255 times a 16-bit coefficient) stays within `i32`.

use crate::pixel::Pixel;
use crate::window::SlidingWindow;
use wide::i32x8;

pub(crate) const LANES: usize = 8;

#[inline]
fn load_lanes<T: Pixel>(slice: &[T]) -> i32x8 {
    i32x8::from([
        slice[0].to_i64() as i32,
        slice[1].to_i64() as i32,
        slice[2].to_i64() as i32,
        slice[3].to_i64() as i32,
        slice[4].to_i64() as i32,
        slice[5].to_i64() as i32,
        slice[6].to_i64() as i32,
        slice[7].to_i64() as i32,
    ])
}

/// Unnormalized `sum(k * w)` for all eight lanes of the current step.
pub(crate) fn weighted_sum_x8<T: Pixel>(
    window: &SlidingWindow<T>,
    taps: &[(usize, usize, i32)],
) -> [i32; LANES] {
    let mut acc = i32x8::ZERO;
    for &(row, col, coeff) in taps {
        let values = load_lanes(&window.row(row)[col..col + LANES]);
        acc += values * i32x8::splat(coeff);
    }
    acc.to_array()
}
