//! Integer kernels and their fixed-point normalization.
//!
//! A [`Kernel`] bundles up to three coefficient planes of equal odd size with
//! one [`Normalization`] pair derived from the absolute weight sum of the first
//! plane. Operators pick the plane they need by index; derivative filters use
//! plane 0 for X and plane 1 for Y.
//!
//! Factory functions mirror the usual kernel intents (box, binomial Gaussian,
//! Sobel, Scharr, Scharr-derived second order) and [`Kernel::dilated`] spreads
//! any kernel over a larger support by inserting zero taps.

pub mod preprocess;

use crate::util::{FilterError, FilterResult, Normalization};

/// Largest number of coefficient planes a kernel may carry.
pub const MAX_PLANES: usize = 3;
/// Largest kernel side, reachable only through dilation.
pub const MAX_DILATED_SIZE: usize = 17;
/// Smallest and largest coefficient accepted (8/16-bit signed or unsigned).
const COEFF_RANGE: (i32, i32) = (i16::MIN as i32, u16::MAX as i32);

/// Returns `true` for the kernel sizes the engine accepts directly.
pub fn is_supported_size(size: usize) -> bool {
    matches!(size, 3 | 5 | 7 | 9 | 11)
}

/// Immutable square coefficient planes plus a normalization pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Kernel {
    size: usize,
    planes: Vec<Vec<i32>>,
    normalization: Normalization,
    scale: usize,
}

impl Kernel {
    /// Builds a kernel from row-major planes of `size * size` taps.
    ///
    /// The normalization pair divides by the absolute weight sum of plane 0.
    pub fn new(size: usize, planes: Vec<Vec<i32>>) -> FilterResult<Self> {
        validate_shape(size, &planes)?;
        let normalization = Normalization::from_sum(abs_sum(&planes[0]))?;
        Ok(Self {
            size,
            planes,
            normalization,
            scale: 1,
        })
    }

    /// Builds a single-plane kernel with normalization by its weight sum.
    pub fn custom(size: usize, taps: Vec<i32>) -> FilterResult<Self> {
        Self::new(size, vec![taps])
    }

    /// Builds a comparison mask: taps equal to zero take part, others are ignored.
    ///
    /// Masks are never normalized.
    pub fn mask(size: usize, taps: Vec<i32>) -> FilterResult<Self> {
        let planes = vec![taps];
        validate_shape(size, &planes)?;
        Ok(Self {
            size,
            planes,
            normalization: Normalization::IDENTITY,
            scale: 1,
        })
    }

    /// All-ones kernel.
    pub fn box_filter(size: usize) -> FilterResult<Self> {
        require_base_size(size)?;
        Self::custom(size, vec![1; size * size])
    }

    /// Binomial Gaussian approximation, the outer product of a binomial row.
    pub fn gaussian(size: usize) -> FilterResult<Self> {
        require_base_size(size)?;
        let row = preprocess::binomial(size);
        Self::custom(size, preprocess::outer(&row, &row))
    }

    /// Sobel pair of any supported size: plane 0 is X, plane 1 is Y.
    pub fn sobel(size: usize) -> FilterResult<Self> {
        require_base_size(size)?;
        let smooth = preprocess::binomial(size);
        let deriv = preprocess::central_difference(size);
        Self::new(
            size,
            vec![
                preprocess::outer(&smooth, &deriv),
                preprocess::outer(&deriv, &smooth),
            ],
        )
    }

    /// 3x3 Scharr pair: plane 0 is X, plane 1 is Y.
    pub fn scharr() -> FilterResult<Self> {
        let (x, y) = preprocess::scharr_taps();
        Self::new(3, vec![x.to_vec(), y.to_vec()])
    }

    /// 5x5 second-order Scharr taps: planes are XX, XY and YY.
    ///
    /// Normalization is a fixed right shift by 5, matching one first-order
    /// Scharr pass; the remaining scale is left to the consumer.
    pub fn scharr_second_order() -> FilterResult<Self> {
        let (x, y) = preprocess::scharr_taps();
        let xx = preprocess::convolve(&x, &x, 3);
        let xy = preprocess::convolve(&x, &y, 3);
        let yy = preprocess::convolve(&y, &y, 3);
        let planes = vec![xx, xy, yy];
        validate_shape(5, &planes)?;
        Ok(Self {
            size: 5,
            planes,
            normalization: Normalization::shift_only(5),
            scale: 1,
        })
    }

    /// Replaces the normalization pair.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Spreads the kernel over `(size - 1) * scale + 1` taps.
    ///
    /// Only taps whose row and column are multiples of `scale` keep a
    /// coefficient; all others are zero. Normalization is unchanged.
    pub fn dilated(&self, scale: usize) -> FilterResult<Self> {
        if scale == 0 {
            return Err(FilterError::InvalidKernelSize { size: 0 });
        }
        let size = (self.size - 1) * scale + 1;
        if size > MAX_DILATED_SIZE {
            return Err(FilterError::InvalidKernelSize { size });
        }
        let planes = self
            .planes
            .iter()
            .map(|plane| preprocess::dilate_plane(plane, self.size, scale))
            .collect();
        Ok(Self {
            size,
            planes,
            normalization: self.normalization,
            scale: self.scale * scale,
        })
    }

    /// Kernel side length.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Kernel radius.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Number of coefficient planes.
    pub fn plane_count(&self) -> usize {
        self.planes.len()
    }

    /// Row-major taps of plane `index`.
    pub fn plane(&self, index: usize) -> Option<&[i32]> {
        self.planes.get(index).map(Vec::as_slice)
    }

    /// Normalization pair.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Dilation factor relative to the base kernel (1 when not dilated).
    pub fn scale(&self) -> usize {
        self.scale
    }
}

/// Row kernel for separable passes; the same taps run horizontally and vertically.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LineKernel {
    taps: Vec<i32>,
    normalization: Normalization,
}

impl LineKernel {
    /// Builds a row kernel normalized by its absolute weight sum.
    pub fn new(taps: Vec<i32>) -> FilterResult<Self> {
        let size = taps.len();
        if size % 2 == 0 || !(3..=MAX_DILATED_SIZE).contains(&size) {
            return Err(FilterError::InvalidKernelSize { size });
        }
        check_coefficients(&taps)?;
        let normalization = Normalization::from_sum(abs_sum(&taps))?;
        Ok(Self {
            taps,
            normalization,
        })
    }

    /// All-ones row.
    pub fn box_filter(size: usize) -> FilterResult<Self> {
        require_base_size(size)?;
        Self::new(vec![1; size])
    }

    /// Binomial row.
    pub fn gaussian(size: usize) -> FilterResult<Self> {
        require_base_size(size)?;
        Self::new(preprocess::binomial(size))
    }

    /// Number of taps.
    pub fn size(&self) -> usize {
        self.taps.len()
    }

    /// Tap values.
    pub fn taps(&self) -> &[i32] {
        &self.taps
    }

    /// Normalization pair for one pass.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }
}

fn require_base_size(size: usize) -> FilterResult<()> {
    if is_supported_size(size) {
        Ok(())
    } else {
        Err(FilterError::InvalidKernelSize { size })
    }
}

fn validate_shape(size: usize, planes: &[Vec<i32>]) -> FilterResult<()> {
    if size % 2 == 0 || !(3..=MAX_DILATED_SIZE).contains(&size) {
        return Err(FilterError::InvalidKernelSize { size });
    }
    if planes.is_empty() || planes.len() > MAX_PLANES {
        return Err(FilterError::KernelShape {
            expected: size * size,
            got: 0,
        });
    }
    for plane in planes {
        if plane.len() != size * size {
            return Err(FilterError::KernelShape {
                expected: size * size,
                got: plane.len(),
            });
        }
        check_coefficients(plane)?;
    }
    Ok(())
}

fn check_coefficients(taps: &[i32]) -> FilterResult<()> {
    match taps
        .iter()
        .find(|&&k| k < COEFF_RANGE.0 || k > COEFF_RANGE.1)
    {
        Some(&value) => Err(FilterError::CoefficientOutOfRange {
            value: value as i64,
        }),
        None => Ok(()),
    }
}

fn abs_sum(taps: &[i32]) -> u64 {
    taps.iter().map(|&k| k.unsigned_abs() as u64).sum()
}
