//! Non-maximum suppression, plain and orientation-guided.

use crate::ops::{Plane, Taps, WindowOp};
use crate::pixel::Pixel;

/// Keeps the center when it is a strict local maximum over the masked taps.
///
/// Ties are broken by position: taps before the center in row-major order may
/// equal it, taps after it must be strictly smaller.
pub(crate) struct NonMaxSuppression {
    before: Vec<(usize, usize)>,
    after: Vec<(usize, usize)>,
    suppressed: i64,
}

impl NonMaxSuppression {
    pub(crate) fn new(mask: &[i32], size: usize, suppressed: i64) -> Self {
        let center = (size * size) / 2;
        let mut before = Vec::new();
        let mut after = Vec::new();
        for (idx, &m) in mask.iter().enumerate() {
            if m != 0 || idx == center {
                continue;
            }
            let pos = (idx / size, idx % size);
            if idx < center {
                before.push(pos);
            } else {
                after.push(pos);
            }
        }
        Self {
            before,
            after,
            suppressed,
        }
    }
}

impl<T: Pixel> WindowOp<T> for NonMaxSuppression {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let center = taps.center(Plane::Primary);
        let beaten_before = self.before.iter().any(|&(y, x)| center < taps.at(y, x));
        let beaten_after = self.after.iter().any(|&(y, x)| center <= taps.at(y, x));
        if beaten_before || beaten_after {
            self.suppressed
        } else {
            center
        }
    }
}

/// Suppresses the center unless it is at least both neighbors along the axis
/// selected by the quantized orientation (secondary input).
///
/// Orientation codes after dropping the low `quantization - 3` bits:
/// 0/4 vertical, 1/5 main diagonal, 2/6 horizontal, 3/7 anti-diagonal.
pub(crate) struct OrientedNonMaxSuppression {
    pub(crate) quantization: u32,
    pub(crate) min: i64,
    pub(crate) max: i64,
}

impl<T: Pixel> WindowOp<T> for OrientedNonMaxSuppression {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let r = taps.radius();
        let magnitude = taps.at(r, r);
        let code = taps.center(Plane::Secondary) >> (self.quantization - 3);
        let (a, b) = match code {
            0 | 4 => (taps.at(r - 1, r), taps.at(r + 1, r)),
            1 | 5 => (taps.at(r - 1, r - 1), taps.at(r + 1, r + 1)),
            2 | 6 => (taps.at(r, r - 1), taps.at(r, r + 1)),
            3 | 7 => (taps.at(r + 1, r - 1), taps.at(r - 1, r + 1)),
            _ => (self.max, self.max),
        };
        if magnitude >= a && magnitude >= b {
            magnitude
        } else {
            self.min
        }
    }
}
