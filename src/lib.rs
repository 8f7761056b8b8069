//! Streamfilter is a fixed-point, streaming 2-D neighborhood filter engine.
//!
//! Frames arrive as row-major streams of small pixel vectors. Each filter keeps
//! only `kernel_size - 1` rows of history in line buffers, assembles a sliding
//! window per step, evaluates a compiled operator for every lane and emits one
//! output vector per input vector, after a fixed latency. All arithmetic is
//! integer; normalization uses precomputed multiply-shift pairs.
//!
//! ```
//! use streamfilter::{Filter, ImageView, Operator};
//!
//! let data: Vec<u8> = (0..64).collect();
//! let view = ImageView::from_slice(&data, 8, 8).unwrap();
//! let filter = Filter::<u8, u8>::builder(8, 8)
//!     .vec_num(4)
//!     .kernel_size(3)
//!     .output(Operator::Box)
//!     .build()
//!     .unwrap();
//! let out = filter.apply(view).unwrap();
//! assert_eq!(out.primary.width(), 8);
//! ```
//!
//! Optional features: `rayon` for frame-level parallelism, `simd` for the
//! eight-lane weighted sum, `image-io` for loading and saving grayscale
//! images and `tracing` for spans around every run.

pub mod filter;
pub mod image;
pub mod kernel;
pub mod lowlevel;
pub mod ops;
pub mod pixel;
pub mod stream;
mod trace;
pub mod util;
pub mod window;

pub use filter::pipeline::{chain, Pipeline, StreamStage};
pub use filter::{
    Filter, FilterBuilder, FilterOutput, OutputSpec, SeparableBuilder, SeparableFilter,
    StreamStats,
};
pub use image::{ImageView, OwnedImage};
pub use kernel::{Kernel, LineKernel};
pub use ops::{contrast_square, HessianSource, LineOperator, Operator, Plane, Precision};
pub use pixel::{Conversion, Pixel};
pub use stream::{Discard, Sink, StreamElement, Vector};
pub use util::{FilterError, FilterResult, Normalization};
pub use window::BorderPolicy;

#[cfg(feature = "image-io")]
pub use image::io;
