//! Error types for streamfilter.

use thiserror::Error;

/// Result alias for streamfilter operations.
pub type FilterResult<T> = std::result::Result<T, FilterError>;

/// Errors raised while configuring or driving a filter.
///
/// Every configuration problem is reported by a constructor or builder before
/// any pixel is processed. Streaming itself is total; only contract violations
/// of the surrounding stream plumbing surface at run time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Image width or height is zero or overflows.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// Row stride is smaller than the image width.
    #[error("invalid stride {stride} for width {width}")]
    InvalidStride { width: usize, stride: usize },
    /// Backing buffer is too small for the requested view.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// Kernel size is not one of the supported odd sizes.
    #[error("unsupported kernel size {size}")]
    InvalidKernelSize { size: usize },
    /// Vector width is not 1, 2, 4 or 8.
    #[error("unsupported vector width {vec_num}")]
    InvalidVectorWidth { vec_num: usize },
    /// Output step is incompatible with the vector width.
    #[error("step {step} is incompatible with vector width {vec_num}: step + 1 must divide it or be a multiple of it")]
    InvalidStep { step: usize, vec_num: usize },
    /// Image width is not a multiple of the vector width.
    #[error("width {width} is not a multiple of vector width {vec_num}")]
    WidthNotVectorAligned { width: usize, vec_num: usize },
    /// Kernel coefficient table has the wrong number of taps or planes.
    #[error("kernel shape mismatch: expected {expected} coefficients, got {got}")]
    KernelShape { expected: usize, got: usize },
    /// A kernel coefficient does not fit the 16-bit coefficient type.
    #[error("kernel coefficient {value} does not fit in 16 bits")]
    CoefficientOutOfRange { value: i64 },
    /// Normalization would divide by zero.
    #[error("degenerate kernel: {reason}")]
    DegenerateKernel { reason: &'static str },
    /// Pixel types are incompatible with the requested operator.
    #[error("unsupported pixel type for {operator}: {reason}")]
    UnsupportedPixelType {
        operator: &'static str,
        reason: &'static str,
    },
    /// Operator parameters or kernel geometry are not supported.
    #[error("unsupported configuration for {operator}: {reason}")]
    UnsupportedOperator {
        operator: &'static str,
        reason: &'static str,
    },
    /// A two-input operator was run without its secondary stream.
    #[error("operator {operator} requires a secondary input stream")]
    MissingSecondaryInput { operator: &'static str },
    /// An input vector does not have the configured number of lanes.
    #[error("vector width mismatch: expected {expected} lanes, got {got}")]
    VectorWidthMismatch { expected: usize, got: usize },
    /// An input stream ended before the frame was complete.
    #[error("input stream ended early: expected {expected} vectors, got {got}")]
    InputUnderrun { expected: usize, got: usize },
    /// A pipeline stage disconnected before the frame was complete.
    #[error("pipeline channel closed: {stage}")]
    ChannelClosed { stage: String },
    /// Image loading or saving failed.
    #[error("image I/O failed: {reason}")]
    ImageIo { reason: String },
}
