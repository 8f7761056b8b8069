//! Weighted sums: box, Gaussian, custom correlation, derivatives and the Hessian.

use crate::ops::{Plane, Taps, WindowOp};
use crate::pixel::Pixel;
use crate::util::Normalization;
#[cfg(feature = "simd")]
use crate::window::SlidingWindow;

/// Non-zero taps of a plane as `(row, col, coeff)`.
fn nonzero_taps(plane: &[i32], size: usize) -> Vec<(usize, usize, i32)> {
    plane
        .iter()
        .enumerate()
        .filter(|(_, &k)| k != 0)
        .map(|(idx, &k)| (idx / size, idx % size, k))
        .collect()
}

fn correlate<T: Pixel>(taps: &Taps<'_, T>, coeffs: &[(usize, usize, i32)]) -> i64 {
    coeffs
        .iter()
        .map(|&(row, col, k)| k as i64 * taps.at(row, col))
        .sum()
}

/// `sum(k[i][j] * w[i][j])` followed by normalization.
pub(crate) struct WeightedSum {
    taps: Vec<(usize, usize, i32)>,
    norm: Normalization,
}

impl WeightedSum {
    pub(crate) fn new(plane: &[i32], size: usize, norm: Normalization) -> Self {
        Self {
            taps: nonzero_taps(plane, size),
            norm,
        }
    }
}

impl<T: Pixel> WindowOp<T> for WeightedSum {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        self.norm.apply(correlate(taps, &self.taps))
    }

    #[cfg(feature = "simd")]
    fn compute_lanes(
        &self,
        primary: &SlidingWindow<T>,
        secondary: Option<&SlidingWindow<T>>,
        size: usize,
        out: &mut [i64],
    ) {
        if out.len() == super::simd::LANES && T::BITS <= 8 {
            let sums = super::simd::weighted_sum_x8(primary, &self.taps);
            for (slot, sum) in out.iter_mut().zip(sums) {
                *slot = self.norm.apply(sum as i64);
            }
            return;
        }
        for (lane, slot) in out.iter_mut().enumerate() {
            *slot = self.compute(&Taps::new(primary, secondary, lane, size));
        }
    }
}

/// Antisymmetric difference `sum(|k| * (positive - negative))`.
///
/// For derivative-x the positive tap is the horizontal mirror of the negative
/// one; for derivative-y the vertical mirror. Only the half of the kernel on
/// the negative side contributes weights, so the kernel's own sign is ignored.
pub(crate) struct Difference {
    pairs: Vec<DifferencePair>,
    norm: Normalization,
}

#[derive(Clone, Copy)]
struct DifferencePair {
    negative: (usize, usize),
    positive: (usize, usize),
    weight: i64,
}

impl Difference {
    pub(crate) fn horizontal(plane: &[i32], size: usize, norm: Normalization) -> Self {
        let radius = size / 2;
        let mut pairs = Vec::new();
        for y in 0..size {
            for x in 0..radius {
                let weight = plane.get(y * size + x).map_or(0, |k| k.unsigned_abs() as i64);
                if weight != 0 {
                    pairs.push(DifferencePair {
                        negative: (y, x),
                        positive: (y, size - 1 - x),
                        weight,
                    });
                }
            }
        }
        Self { pairs, norm }
    }

    pub(crate) fn vertical(plane: &[i32], size: usize, norm: Normalization) -> Self {
        let radius = size / 2;
        let mut pairs = Vec::new();
        for y in 0..radius {
            for x in 0..size {
                let weight = plane.get(y * size + x).map_or(0, |k| k.unsigned_abs() as i64);
                if weight != 0 {
                    pairs.push(DifferencePair {
                        negative: (y, x),
                        positive: (size - 1 - y, x),
                        weight,
                    });
                }
            }
        }
        Self { pairs, norm }
    }

    /// Unnormalized difference over one input plane.
    pub(crate) fn raw<T: Pixel>(&self, taps: &Taps<'_, T>, plane: Plane) -> i64 {
        self.pairs
            .iter()
            .map(|p| {
                let positive = taps.plane_at(plane, p.positive.0, p.positive.1);
                let negative = taps.plane_at(plane, p.negative.0, p.negative.1);
                p.weight * (positive - negative)
            })
            .sum()
    }

    fn normalized<T: Pixel>(&self, taps: &Taps<'_, T>, plane: Plane) -> i64 {
        self.norm.apply(self.raw(taps, plane))
    }
}

impl<T: Pixel> WindowOp<T> for Difference {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        self.normalized(taps, Plane::Primary)
    }
}

enum HessianTerms {
    SecondOrder {
        xx: Vec<(usize, usize, i32)>,
        xy: Vec<(usize, usize, i32)>,
        yy: Vec<(usize, usize, i32)>,
    },
    Gradients {
        dx: Difference,
        dy: Difference,
    },
}

/// `(Lxx * Lyy - Lxy^2) >> post_shift`.
///
/// Second derivatives come either from three second-order planes applied to
/// the intensity window, or from a first-order pair applied to `Lx` (primary)
/// and `Ly` (secondary): `Lxx = dx(Lx)`, `Lxy = dy(Lx)`, `Lyy = dy(Ly)`. The
/// determinant is formed in `i128` and saturated to `i64`.
pub(crate) struct HessianDeterminant {
    terms: HessianTerms,
    norm: Normalization,
    post_shift: u32,
}

impl HessianDeterminant {
    pub(crate) fn second_order(
        planes: [&[i32]; 3],
        size: usize,
        norm: Normalization,
        post_shift: u32,
    ) -> Self {
        Self {
            terms: HessianTerms::SecondOrder {
                xx: nonzero_taps(planes[0], size),
                xy: nonzero_taps(planes[1], size),
                yy: nonzero_taps(planes[2], size),
            },
            norm,
            post_shift: post_shift.min(127),
        }
    }

    pub(crate) fn from_gradients(
        x: &[i32],
        y: &[i32],
        size: usize,
        norm: Normalization,
        post_shift: u32,
    ) -> Self {
        Self {
            terms: HessianTerms::Gradients {
                dx: Difference::horizontal(x, size, norm),
                dy: Difference::vertical(y, size, norm),
            },
            norm,
            post_shift: post_shift.min(127),
        }
    }
}

impl<T: Pixel> WindowOp<T> for HessianDeterminant {
    fn compute(&self, taps: &Taps<'_, T>) -> i64 {
        let (lxx, lxy, lyy) = match &self.terms {
            HessianTerms::SecondOrder { xx, xy, yy } => (
                self.norm.apply(correlate(taps, xx)),
                self.norm.apply(correlate(taps, xy)),
                self.norm.apply(correlate(taps, yy)),
            ),
            HessianTerms::Gradients { dx, dy } => (
                dx.normalized(taps, Plane::Primary),
                dy.normalized(taps, Plane::Primary),
                dy.normalized(taps, Plane::Secondary),
            ),
        };
        let det = lxx as i128 * lyy as i128 - lxy as i128 * lxy as i128;
        (det >> self.post_shift).clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

#[cfg(test)]
mod tests {
    use super::{Difference, HessianDeterminant, WeightedSum};
    use crate::kernel::Kernel;
    use crate::ops::{window_from, Taps, WindowOp};

    #[test]
    fn box_sum_of_constant_returns_constant() {
        let kernel = Kernel::box_filter(3).unwrap();
        let op = WeightedSum::new(kernel.plane(0).unwrap(), 3, kernel.normalization());
        let window = window_from(&[77; 9], 3);
        assert_eq!(WindowOp::<u8>::compute(&op, &Taps::new(&window, None, 0, 3)), 77);
    }

    #[test]
    fn sobel_x_on_ramp_is_positive() {
        let kernel = Kernel::sobel(3).unwrap();
        let values = [10, 20, 30, 10, 20, 30, 10, 20, 30];
        let window = window_from(&values, 3);
        let taps = Taps::new(&window, None, 0, 3);
        let dx = Difference::horizontal(kernel.plane(0).unwrap(), 3, kernel.normalization());
        let dy = Difference::vertical(kernel.plane(1).unwrap(), 3, kernel.normalization());
        // (1 + 2 + 1) * 20 / 8
        assert_eq!(WindowOp::<u8>::compute(&dx, &taps), 10);
        assert_eq!(WindowOp::<u8>::compute(&dy, &taps), 0);
    }

    #[test]
    fn hessian_of_flat_patch_is_zero() {
        let kernel = Kernel::scharr_second_order().unwrap();
        let planes = [
            kernel.plane(0).unwrap(),
            kernel.plane(1).unwrap(),
            kernel.plane(2).unwrap(),
        ];
        let op = HessianDeterminant::second_order(planes, 5, kernel.normalization(), 10);
        let window = window_from(&[90; 25], 5);
        assert_eq!(WindowOp::<u8>::compute(&op, &Taps::new(&window, None, 0, 5)), 0);
    }

    #[test]
    fn hessian_from_gradients_differentiates_both_inputs() {
        let kernel = Kernel::scharr().unwrap();
        let op = HessianDeterminant::from_gradients(
            kernel.plane(0).unwrap(),
            kernel.plane(1).unwrap(),
            3,
            kernel.normalization(),
            0,
        );
        // Lx grows by 32 per column, Ly by 64 per row.
        let lx: Vec<i16> = (0..9).map(|i| (i % 3) as i16 * 32).collect();
        let ly: Vec<i16> = (0..9).map(|i| (i / 3) as i16 * 64).collect();
        let lx = window_from(&lx, 3);
        let ly = window_from(&ly, 3);
        // Lxx = 16 * 64 / 32, Lxy = 0, Lyy = 16 * 128 / 32.
        assert_eq!(WindowOp::<i16>::compute(&op, &Taps::new(&lx, Some(&ly), 0, 3)), 32 * 64);
    }

    #[test]
    fn hessian_saturates_instead_of_overflowing() {
        let huge = [65535; 9];
        let zero = [0; 9];
        let op = HessianDeterminant::second_order(
            [&huge[..], &zero[..], &huge[..]],
            3,
            crate::util::Normalization::IDENTITY,
            0,
        );
        let window = window_from(&[u32::MAX; 9], 3);
        assert_eq!(WindowOp::<u32>::compute(&op, &Taps::new(&window, None, 0, 3)), i64::MAX);
    }
}
