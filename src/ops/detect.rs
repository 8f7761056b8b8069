//! Segment-test corner response and hysteresis thresholding.

use crate::ops::{Plane, Taps, WindowOp};
use crate::pixel::Pixel;

/// Bresenham circle of radius 3 on a 7x7 window, clockwise from the top.
const RING: [(usize, usize); 16] = [
    (0, 3),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 6),
    (4, 6),
    (5, 5),
    (6, 4),
    (6, 3),
    (6, 2),
    (5, 1),
    (4, 0),
    (3, 0),
    (2, 0),
    (1, 1),
    (0, 2),
];
/// Contiguous ring points an arc must cover.
const ARC: usize = 9;
/// Output for pixels that are neither strong nor promoted.
pub(crate) const HYSTERESIS_LOW: i64 = 42;
const BRIGHTER: u8 = 1;
const DARKER: u8 = 2;

/// FAST-9 style response: the best contrast any 9-point arc keeps uniformly
/// brighter or darker than the center. Ring points equal to the center count
/// as darker with zero contrast.
pub(crate) struct SegmentTest;

impl<T: Pixel> WindowOp<T> for SegmentTest {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let center = taps.at(3, 3);
        let mut diff = [0i64; 16];
        let mut side = [0u8; 16];
        for (k, &(y, x)) in RING.iter().enumerate() {
            let value = taps.at(y, x);
            diff[k] = (value - center).abs();
            side[k] = if value > center { BRIGHTER } else { DARKER };
        }

        let mut response = 0i64;
        for start in 0..RING.len() {
            let mut contrast = i64::MAX;
            let mut sides = BRIGHTER | DARKER;
            for step in 0..ARC {
                let k = (start + step) % RING.len();
                contrast = contrast.min(diff[k]);
                sides &= side[k];
            }
            if sides != 0 {
                response = response.max(contrast);
            }
        }
        response
    }
}

/// Strong pixels and weak pixels touching a strong neighbor become `high`;
/// everything else becomes [`HYSTERESIS_LOW`].
pub(crate) struct Hysteresis {
    pub(crate) lower: i64,
    pub(crate) upper: i64,
    pub(crate) high: i64,
}

impl<T: Pixel> WindowOp<T> for Hysteresis {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let center = taps.center(Plane::Primary);
        let strong = center >= self.upper;
        let weak = center >= self.lower;
        let r = taps.radius();
        let promoted = weak
            && (0..taps.size()).any(|y| {
                (0..taps.size()).any(|x| (y != r || x != r) && taps.at(y, x) >= self.upper)
            });
        if strong || promoted {
            self.high
        } else {
            HYSTERESIS_LOW
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Hysteresis, SegmentTest, HYSTERESIS_LOW};
    use crate::ops::{window_from, Taps, WindowOp};

    fn segment(values: &[u8]) -> i64 {
        let window = window_from(values, 7);
        WindowOp::<u8>::compute(&SegmentTest, &Taps::new(&window, None, 0, 7))
    }

    #[test]
    fn uniform_patch_has_no_response() {
        assert_eq!(segment(&[120; 49]), 0);
    }

    #[test]
    fn dark_center_on_bright_ring_responds_with_contrast() {
        let mut values = [200u8; 49];
        values[3 * 7 + 3] = 50;
        assert_eq!(segment(&values), 150);
    }

    #[test]
    fn short_bright_arc_is_rejected() {
        let mut values = [100u8; 49];
        // Eight bright ring points are one short of an arc.
        for &(y, x) in super::RING.iter().take(8) {
            values[y * 7 + x] = 180;
        }
        // Equal points count as darker with zero contrast, so the response
        // stays zero even though nine darker-or-equal points exist.
        assert_eq!(segment(&values), 0);
    }

    #[test]
    fn weak_pixel_needs_strong_neighbor() {
        let op = Hysteresis {
            lower: 50,
            upper: 150,
            high: 255,
        };
        let isolated = window_from(&[0u8, 0, 0, 0, 80, 0, 0, 0, 0], 3);
        let connected = window_from(&[0u8, 0, 200, 0, 80, 0, 0, 0, 0], 3);
        assert_eq!(
            WindowOp::<u8>::compute(&op, &Taps::new(&isolated, None, 0, 3)),
            HYSTERESIS_LOW
        );
        assert_eq!(WindowOp::<u8>::compute(&op, &Taps::new(&connected, None, 0, 3)), 255);
    }

    #[test]
    fn uniform_sub_threshold_patch_is_low() {
        let op = Hysteresis {
            lower: 50,
            upper: 200,
            high: 255,
        };
        let window = window_from(&[10u8; 9], 3);
        assert_eq!(WindowOp::<u8>::compute(&op, &Taps::new(&window, None, 0, 3)), 42);
    }
}
