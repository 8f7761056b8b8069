//! One-dimensional operators for separable passes.

use crate::kernel::LineKernel;
use crate::util::{FilterError, FilterResult};

/// Operator applied along one axis of a separable filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LineOperator {
    /// Normalized sum.
    Box,
    /// Normalized weighted sum.
    Gaussian,
    /// Minimum.
    Erode,
    /// Maximum.
    Dilate,
}

impl LineOperator {
    /// Short operator name used in errors and traces.
    pub fn name(&self) -> &'static str {
        match self {
            LineOperator::Box => "box",
            LineOperator::Gaussian => "gaussian",
            LineOperator::Erode => "erode",
            LineOperator::Dilate => "dilate",
        }
    }

    /// Checks that the kernel shape suits the operator.
    pub fn validate(&self, kernel: &LineKernel) -> FilterResult<()> {
        let weighted = matches!(self, LineOperator::Box | LineOperator::Gaussian);
        if weighted && kernel.taps().iter().any(|&k| k < 0) {
            return Err(FilterError::UnsupportedOperator {
                operator: self.name(),
                reason: "separable weights must be non-negative",
            });
        }
        Ok(())
    }

    /// Evaluates the operator over `samples`, one per kernel tap.
    #[inline]
    pub fn apply(&self, kernel: &LineKernel, samples: &[i64]) -> i64 {
        match self {
            LineOperator::Box | LineOperator::Gaussian => {
                let sum = kernel
                    .taps()
                    .iter()
                    .zip(samples)
                    .map(|(&k, &s)| k as i64 * s)
                    .sum();
                kernel.normalization().apply(sum)
            }
            LineOperator::Erode => samples.iter().copied().min().unwrap_or(0),
            LineOperator::Dilate => samples.iter().copied().max().unwrap_or(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LineOperator;
    use crate::kernel::LineKernel;

    #[test]
    fn gaussian_row_rounds_half_up() {
        let kernel = LineKernel::gaussian(3).unwrap();
        // (1*10 + 2*11 + 1*13) / 4 = 11.25
        assert_eq!(LineOperator::Gaussian.apply(&kernel, &[10, 11, 13]), 11);
        // (1*10 + 2*11 + 1*12) / 4 = 11.0
        assert_eq!(LineOperator::Gaussian.apply(&kernel, &[10, 11, 12]), 11);
        assert_eq!(LineOperator::Gaussian.apply(&kernel, &[1, 1, 0]), 1);
    }

    #[test]
    fn morphology_ignores_weights() {
        let kernel = LineKernel::box_filter(5).unwrap();
        let samples = [4, 9, 1, 7, 3];
        assert_eq!(LineOperator::Erode.apply(&kernel, &samples), 1);
        assert_eq!(LineOperator::Dilate.apply(&kernel, &samples), 9);
    }

    #[test]
    fn negative_weights_are_rejected_for_sums() {
        let kernel = LineKernel::new(vec![-1, 2, -1]).unwrap();
        assert!(LineOperator::Box.validate(&kernel).is_err());
        assert!(LineOperator::Dilate.validate(&kernel).is_ok());
    }
}
