//! Building blocks for custom streaming drivers.
//!
//! [`Filter`](crate::Filter) covers the common case. These re-exports let a
//! caller wire line buffers, border correction, windows and compiled
//! operators into a loop of their own, for example to interleave several
//! filters inside one raster walk.

pub use crate::kernel::preprocess::{
    binomial, central_difference, convolve, dilate_plane, outer, scharr_taps,
};
pub use crate::ops::{median_network_3x3, sort_network, Taps, WindowOp};
pub use crate::stream::{collect_frame, vectorize, MAX_VEC_NUM};
pub use crate::window::{BorderPolicy, Geometry, LineBufferBank, SlidingWindow};
