//! Neighborhood operators.
//!
//! An [`Operator`] is a plain configuration tag. [`Operator::compile`] turns it
//! into a boxed [`WindowOp`] once per filter, so the streaming loop calls a
//! single vtable entry per lane and never re-inspects the tag.
//!
//! Operators see the window through [`Taps`], which offsets column indices by
//! the lane being evaluated. All arithmetic is `i64`; narrowing to the output
//! type happens in the driver.

mod detect;
mod diffusion;
mod line;
mod linear;
mod rank;
#[cfg(feature = "simd")]
mod simd;
mod suppress;

pub use diffusion::contrast_square;
pub use line::LineOperator;
pub use rank::{median_network_3x3, sort_network};

use crate::kernel::{is_supported_size, Kernel};
use crate::pixel::Pixel;
use crate::util::{FilterError, FilterResult};
use crate::window::SlidingWindow;

/// Input plane selector for two-input operators.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Plane {
    /// The first input stream.
    #[default]
    Primary,
    /// The second input stream.
    Secondary,
}

/// Fixed-point budget of [`Operator::Conductivity`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Precision {
    /// Narrow denominator: 12 bits for 8-bit data, 17 bits for 16-bit data.
    LowPower,
    /// 18-bit denominator and a 14-bit quotient for every pixel width.
    Standard,
    /// 24-bit quotient over a 15 or 23-bit denominator.
    #[default]
    High,
}

/// Where [`Operator::HessianDeterminant`] takes its second derivatives from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum HessianSource {
    /// Unsigned intensities correlated with second-order kernel planes 0, 1
    /// and 2 (xx, xy, yy).
    #[default]
    Intensity,
    /// Signed first derivatives: `Lx` on the primary input and `Ly` on the
    /// secondary input, differentiated again with kernel planes 0 (x) and 1 (y).
    Gradients,
}

/// Neighborhood operator tag with its scalar parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    /// Normalized sum of all taps.
    Box,
    /// Normalized weighted sum with a binomial kernel.
    Gaussian,
    /// Window minimum.
    Erode,
    /// Window maximum.
    Dilate,
    /// Window median; 3x3 uses a fixed exchange network.
    Median,
    /// Horizontal derivative from an antisymmetric kernel plane.
    DerivativeX,
    /// Vertical derivative from an antisymmetric kernel plane.
    DerivativeY,
    /// Normalized correlation with a caller-supplied plane.
    Convolve,
    /// Keeps strict local maxima over the taps whose mask value is zero.
    NonMaxSuppression,
    /// FAST-style 16-point ring response, 7x7 only.
    SegmentTest,
    /// Double-threshold classification with neighborhood promotion.
    Hysteresis {
        /// Weak threshold.
        lower: i64,
        /// Strong threshold.
        upper: i64,
    },
    /// Non-max suppression along a quantized orientation from the secondary input.
    OrientedNonMaxSuppression {
        /// Bits used by the orientation input; the top three select the axis.
        quantization: u32,
    },
    /// One explicit diffusion step; the secondary input carries conductivity.
    Diffusion {
        /// Step size in 16.16 fixed point.
        step: u32,
    },
    /// Perona-Malik conductivity from internal Scharr derivatives.
    Conductivity {
        /// Contrast factor squared as a 0.32 fraction, see [`contrast_square`].
        contrast_square: u32,
        /// Width of the fixed-point quotient.
        precision: Precision,
    },
    /// Center tap of one input plane.
    Forward(Plane),
    /// Determinant of the Hessian `Lxx * Lyy - Lxy^2`.
    HessianDeterminant {
        /// Right shift applied to the determinant.
        post_shift: u32,
        /// Intensity or first-derivative inputs.
        source: HessianSource,
    },
}

impl Operator {
    /// Short operator name used in errors and traces.
    pub fn name(&self) -> &'static str {
        match self {
            Operator::Box => "box",
            Operator::Gaussian => "gaussian",
            Operator::Erode => "erode",
            Operator::Dilate => "dilate",
            Operator::Median => "median",
            Operator::DerivativeX => "derivative_x",
            Operator::DerivativeY => "derivative_y",
            Operator::Convolve => "convolve",
            Operator::NonMaxSuppression => "non_max_suppression",
            Operator::SegmentTest => "segment_test",
            Operator::Hysteresis { .. } => "hysteresis",
            Operator::OrientedNonMaxSuppression { .. } => "oriented_non_max_suppression",
            Operator::Diffusion { .. } => "diffusion",
            Operator::Conductivity { .. } => "conductivity",
            Operator::Forward(_) => "forward",
            Operator::HessianDeterminant { .. } => "hessian_determinant",
        }
    }

    /// Returns `true` when the operator reads the secondary input.
    pub fn needs_secondary(&self) -> bool {
        matches!(
            self,
            Operator::OrientedNonMaxSuppression { .. }
                | Operator::Diffusion { .. }
                | Operator::Forward(Plane::Secondary)
                | Operator::HessianDeterminant {
                    source: HessianSource::Gradients,
                    ..
                }
        )
    }

    /// Plane whose center is passed through on the border ring.
    pub fn passthrough_plane(&self) -> Plane {
        match self {
            Operator::Forward(plane) => *plane,
            _ => Plane::Primary,
        }
    }

    fn uses_kernel_plane(&self) -> bool {
        matches!(
            self,
            Operator::Box
                | Operator::Gaussian
                | Operator::DerivativeX
                | Operator::DerivativeY
                | Operator::Convolve
                | Operator::NonMaxSuppression
        )
    }

    fn accepts_dilated(&self) -> bool {
        matches!(
            self,
            Operator::Gaussian
                | Operator::DerivativeX
                | Operator::DerivativeY
                | Operator::Convolve
                | Operator::NonMaxSuppression
                | Operator::HessianDeterminant { .. }
        )
    }

    /// Checks pixel types, kernel geometry and parameters.
    pub fn validate<I: Pixel, O: Pixel>(&self, kernel: &Kernel, plane: usize) -> FilterResult<()> {
        let operator = self.name();
        let unsupported = |reason| Err(FilterError::UnsupportedOperator { operator, reason });
        let bad_type = |reason| Err(FilterError::UnsupportedPixelType { operator, reason });

        if kernel.scale() > 1 && !self.accepts_dilated() {
            return unsupported("dilated kernels are not supported");
        }
        if kernel.scale() == 1 && !is_supported_size(kernel.size()) {
            return Err(FilterError::InvalidKernelSize {
                size: kernel.size(),
            });
        }
        if self.uses_kernel_plane() && plane >= kernel.plane_count() {
            return unsupported("kernel plane index out of range");
        }

        match *self {
            Operator::Box | Operator::Gaussian | Operator::Median | Operator::Erode | Operator::Dilate
                if I::SIGNED =>
            {
                bad_type("input must be unsigned")
            }
            Operator::DerivativeX | Operator::DerivativeY if I::SIGNED || !O::SIGNED => {
                bad_type("input must be unsigned and output signed")
            }
            Operator::HessianDeterminant { source, .. } => {
                let (planes, signed_input) = match source {
                    HessianSource::Intensity => (3, false),
                    HessianSource::Gradients => (2, true),
                };
                if kernel.plane_count() < planes {
                    match source {
                        HessianSource::Intensity => unsupported("requires xx, xy and yy kernel planes"),
                        HessianSource::Gradients => unsupported("requires x and y kernel planes"),
                    }
                } else if I::BITS > 16 {
                    bad_type("input must be 8 or 16 bit")
                } else if I::SIGNED != signed_input {
                    match source {
                        HessianSource::Intensity => bad_type("intensity input must be unsigned"),
                        HessianSource::Gradients => bad_type("gradient input must be signed"),
                    }
                } else if !O::SIGNED {
                    bad_type("output must be signed")
                } else {
                    Ok(())
                }
            }
            Operator::SegmentTest if kernel.size() != 7 => unsupported("requires a 7x7 window"),
            Operator::Hysteresis { lower, upper } if lower > upper => {
                unsupported("lower threshold exceeds upper threshold")
            }
            Operator::OrientedNonMaxSuppression { quantization } => {
                if kernel.size() != 3 {
                    unsupported("requires a 3x3 window")
                } else if quantization < 3 || quantization > I::BITS {
                    unsupported("quantization must be between 3 and the input width")
                } else {
                    Ok(())
                }
            }
            Operator::Diffusion { .. } | Operator::Conductivity { .. } => {
                if kernel.size() != 3 {
                    unsupported("requires a 3x3 window")
                } else if I::SIGNED || !(I::BITS == 8 || I::BITS == 16) {
                    bad_type("input must be unsigned 8 or 16 bit")
                } else if O::BITS != I::BITS || O::SIGNED {
                    bad_type("output must match the input type")
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }

    /// Builds the per-lane implementation for input type `I`.
    ///
    /// `range` is the `(min, max)` of the output type, used by operators whose
    /// result saturates to the output extremes.
    pub fn compile<I: Pixel>(
        &self,
        kernel: &Kernel,
        plane: usize,
        range: (i64, i64),
    ) -> Box<dyn WindowOp<I>> {
        let size = kernel.size();
        let taps = kernel.plane(plane).unwrap_or(&[]);
        let norm = kernel.normalization();
        match *self {
            Operator::Box | Operator::Gaussian | Operator::Convolve => {
                Box::new(linear::WeightedSum::new(taps, size, norm))
            }
            Operator::DerivativeX => Box::new(linear::Difference::horizontal(taps, size, norm)),
            Operator::DerivativeY => Box::new(linear::Difference::vertical(taps, size, norm)),
            Operator::HessianDeterminant { post_shift, source } => {
                let plane_or_empty = |i| kernel.plane(i).unwrap_or(&[]);
                Box::new(match source {
                    HessianSource::Intensity => linear::HessianDeterminant::second_order(
                        [plane_or_empty(0), plane_or_empty(1), plane_or_empty(2)],
                        size,
                        norm,
                        post_shift,
                    ),
                    HessianSource::Gradients => linear::HessianDeterminant::from_gradients(
                        plane_or_empty(0),
                        plane_or_empty(1),
                        size,
                        norm,
                        post_shift,
                    ),
                })
            }
            Operator::Erode => Box::new(rank::Extremum { max: false }),
            Operator::Dilate => Box::new(rank::Extremum { max: true }),
            Operator::Median if size == 3 => Box::new(rank::Median3x3),
            Operator::Median => Box::new(rank::MedianNetwork::new(size * size)),
            Operator::NonMaxSuppression => {
                Box::new(suppress::NonMaxSuppression::new(taps, size, I::min_i64()))
            }
            Operator::OrientedNonMaxSuppression { quantization } => {
                Box::new(suppress::OrientedNonMaxSuppression {
                    quantization,
                    min: I::min_i64(),
                    max: I::max_i64(),
                })
            }
            Operator::SegmentTest => Box::new(detect::SegmentTest),
            Operator::Hysteresis { lower, upper } => Box::new(detect::Hysteresis {
                lower,
                upper,
                high: range.1,
            }),
            Operator::Diffusion { step } => Box::new(diffusion::Diffusion {
                step,
                bits: I::BITS,
                max: I::max_i64(),
            }),
            Operator::Conductivity {
                contrast_square,
                precision,
            } => Box::new(diffusion::Conductivity::new(contrast_square, I::BITS, precision)),
            Operator::Forward(plane) => Box::new(diffusion::Forward { plane }),
        }
    }
}

/// Lane-offset view of the primary and optional secondary windows.
pub struct Taps<'a, T> {
    primary: &'a SlidingWindow<T>,
    secondary: Option<&'a SlidingWindow<T>>,
    lane: usize,
    size: usize,
}

impl<'a, T: Pixel> Taps<'a, T> {
    /// Neighborhood of `lane` for a `size x size` kernel.
    pub fn new(
        primary: &'a SlidingWindow<T>,
        secondary: Option<&'a SlidingWindow<T>>,
        lane: usize,
        size: usize,
    ) -> Self {
        Self {
            primary,
            secondary,
            lane,
            size,
        }
    }

    /// Primary tap at kernel row `i`, column `j`.
    #[inline]
    pub fn at(&self, i: usize, j: usize) -> i64 {
        self.primary.at(i, self.lane + j).to_i64()
    }

    /// Secondary tap at kernel row `i`, column `j`; zero without a secondary input.
    #[inline]
    pub fn secondary_at(&self, i: usize, j: usize) -> i64 {
        self.secondary
            .map(|w| w.at(i, self.lane + j).to_i64())
            .unwrap_or(0)
    }

    /// Tap of `plane` at kernel row `i`, column `j`.
    #[inline]
    pub fn plane_at(&self, plane: Plane, i: usize, j: usize) -> i64 {
        match plane {
            Plane::Primary => self.at(i, j),
            Plane::Secondary => self.secondary_at(i, j),
        }
    }

    /// Center tap of `plane`.
    #[inline]
    pub fn center(&self, plane: Plane) -> i64 {
        let r = self.size / 2;
        self.plane_at(plane, r, r)
    }

    /// Kernel side length.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Kernel radius.
    #[inline]
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// Iterates primary taps in row-major order.
    pub fn values(&self) -> impl Iterator<Item = i64> + '_ {
        (0..self.size).flat_map(move |i| (0..self.size).map(move |j| self.at(i, j)))
    }
}

/// Compiled operator evaluated once per lane and step.
pub trait WindowOp<T: Pixel>: Send + Sync {
    /// Result for one lane.
    fn compute(&self, taps: &Taps<'_, T>) -> i64;

    /// Results for all lanes of one step.
    fn compute_lanes(
        &self,
        primary: &SlidingWindow<T>,
        secondary: Option<&SlidingWindow<T>>,
        size: usize,
        out: &mut [i64],
    ) {
        for (lane, slot) in out.iter_mut().enumerate() {
            *slot = self.compute(&Taps::new(primary, secondary, lane, size));
        }
    }
}

/// Loads one `size x size` neighborhood into lane 0 of a fresh window.
#[cfg(test)]
pub(crate) fn window_from<T: Pixel>(values: &[T], size: usize) -> SlidingWindow<T> {
    use crate::window::{BorderPolicy, Geometry};

    let geometry = Geometry::new(size, size, size, 1).expect("valid test geometry");
    let mut window = SlidingWindow::new(size, &geometry);
    for x in 0..size {
        let group: Vec<T> = (0..size).map(|row| values[row * size + x]).collect();
        window.shift_and_refill(&group, x, size, BorderPolicy::Undefined);
    }
    window
}
