//! Line buffers, border policies and the sliding window.
//!
//! These are the memory-side building blocks of the streaming engine. They
//! hold at most `kernel_size` rows of one frame and are exported through
//! [`crate::lowlevel`] for callers assembling their own drivers.

pub mod border;
pub mod line_buffer;
pub mod sliding;

pub use border::BorderPolicy;
pub use line_buffer::LineBufferBank;
pub use sliding::SlidingWindow;

use crate::kernel::MAX_DILATED_SIZE;
use crate::stream::is_supported_vec_num;
use crate::util::{FilterError, FilterResult};

/// Frame and window dimensions shared by every stage of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    width: usize,
    height: usize,
    kernel_size: usize,
    vec_num: usize,
}

impl Geometry {
    /// Validates frame size, kernel size and vector width.
    pub fn new(width: usize, height: usize, kernel_size: usize, vec_num: usize) -> FilterResult<Self> {
        if width == 0 || height == 0 {
            return Err(FilterError::InvalidDimensions { width, height });
        }
        if kernel_size % 2 == 0 || !(3..=MAX_DILATED_SIZE).contains(&kernel_size) {
            return Err(FilterError::InvalidKernelSize { size: kernel_size });
        }
        if !is_supported_vec_num(vec_num) {
            return Err(FilterError::InvalidVectorWidth { vec_num });
        }
        if width % vec_num != 0 {
            return Err(FilterError::WidthNotVectorAligned { width, vec_num });
        }
        Ok(Self {
            width,
            height,
            kernel_size,
            vec_num,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Kernel side length.
    pub fn kernel_size(&self) -> usize {
        self.kernel_size
    }

    /// Kernel radius.
    pub fn radius(&self) -> usize {
        self.kernel_size / 2
    }

    /// Lanes per vector.
    pub fn vec_num(&self) -> usize {
        self.vec_num
    }

    /// Vectors per row.
    pub fn vec_cols(&self) -> usize {
        self.width / self.vec_num
    }

    /// Vectors per frame.
    pub fn vectors(&self) -> usize {
        self.vec_cols() * self.height
    }

    /// Window width: `2R + V` padded so `WIN_COLS - R` is a multiple of `V`.
    pub fn win_cols(&self) -> usize {
        let r = self.radius();
        let v = self.vec_num;
        2 * r + v + (v - r % v) % v
    }

    /// Column steps between reading a vector and emitting its result.
    pub fn overhead(&self) -> usize {
        (self.win_cols() - self.radius()) / self.vec_num - 1
    }

    /// Returns `true` when output pixel `(x, y)` lies within the radius of an edge.
    #[inline]
    pub fn in_border_ring(&self, x: usize, y: usize) -> bool {
        let r = self.radius();
        x < r || y < r || x + r >= self.width || y + r >= self.height
    }
}
