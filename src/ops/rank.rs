//! Order statistics: erosion, dilation and medians.

use crate::ops::{Taps, WindowOp};
use crate::pixel::Pixel;

/// Largest window the median scratch buffer holds (11x11).
const MAX_TAPS: usize = 121;

/// Window minimum (`max == false`) or maximum (`max == true`).
pub(crate) struct Extremum {
    pub(crate) max: bool,
}

impl<T: Pixel> WindowOp<T> for Extremum {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let values = taps.values();
        let best = if self.max { values.max() } else { values.min() };
        best.unwrap_or(0)
    }
}

#[inline]
fn exchange(a: i64, b: i64) -> (i64, i64) {
    if a > b {
        (b, a)
    } else {
        (a, b)
    }
}

/// Median of nine values with a fixed 19-exchange network.
///
/// Values are in row-major window order. The network only tracks the
/// comparisons that can still influence the middle rank.
pub fn median_network_3x3(a: [i64; 9]) -> i64 {
    let (b0, b1) = exchange(a[0], a[1]);
    let (b3, b4) = exchange(a[3], a[4]);
    let (b6, b7) = exchange(a[6], a[7]);
    let (c1, c2) = exchange(b1, a[2]);
    let (c4, c5) = exchange(b4, a[5]);
    let (c7, c8) = exchange(b7, a[8]);
    let (d0, d1) = exchange(b0, c1);
    let (d3, d4) = exchange(b3, c4);
    let (d6, d7) = exchange(b6, c7);
    let (_e0, e1) = exchange(d0, d3);
    let (e3, e4) = exchange(d1, d4);
    let (e7, _e8) = exchange(c5, c8);
    let (_f1, f2) = exchange(e1, d6);
    let (f4, _f5) = exchange(e4, d7);
    let (f6, _f7) = exchange(c2, e7);
    let (_g3, g4) = exchange(e3, f4);
    let (h3, h4) = exchange(f2, g4);
    let (i4, _i5) = exchange(h4, f6);
    let (_j3, j4) = exchange(h3, i4);
    j4
}

/// Sorts `values` ascending with Batcher's merge-exchange network.
///
/// The comparison sequence depends only on the length, so it maps onto a
/// fixed network of compare-and-swap stages.
pub fn sort_network(values: &mut [i64]) {
    let n = values.len();
    if n < 2 {
        return;
    }
    let t = usize::BITS - (n - 1).leading_zeros();
    let mut p = 1usize << (t - 1);
    while p > 0 {
        let mut q = 1usize << (t - 1);
        let mut r = 0usize;
        let mut d = p;
        loop {
            for i in 0..n - d {
                if i & p == r {
                    let (lo, hi) = exchange(values[i], values[i + d]);
                    values[i] = lo;
                    values[i + d] = hi;
                }
            }
            if q == p {
                break;
            }
            d = q - p;
            q >>= 1;
            r = p;
        }
        p >>= 1;
    }
}

/// 3x3 median through [`median_network_3x3`].
pub(crate) struct Median3x3;

impl<T: Pixel> WindowOp<T> for Median3x3 {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let mut a = [0i64; 9];
        for (slot, value) in a.iter_mut().zip(taps.values()) {
            *slot = value;
        }
        median_network_3x3(a)
    }
}

/// NxN median through [`sort_network`].
pub(crate) struct MedianNetwork {
    len: usize,
}

impl MedianNetwork {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            len: len.min(MAX_TAPS),
        }
    }
}

impl<T: Pixel> WindowOp<T> for MedianNetwork {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let mut scratch = [0i64; MAX_TAPS];
        let values = &mut scratch[..self.len];
        for (slot, value) in values.iter_mut().zip(taps.values()) {
            *slot = value;
        }
        sort_network(values);
        values[self.len / 2]
    }
}
