//! Vectorized pixel streams.
//!
//! A frame travels through the engine as a row-major sequence of [`Vector`]s,
//! each holding `vec_num` adjacent pixels of one row. Outputs are wrapped in
//! [`StreamElement`] so frame boundaries are visible in-band.

use crate::image::{ImageView, OwnedImage};
use crate::util::{FilterError, FilterResult};
use std::sync::mpsc::SyncSender;

/// Largest supported vector width.
pub const MAX_VEC_NUM: usize = 8;

/// Returns `true` for vector widths the engine accepts.
pub fn is_supported_vec_num(vec_num: usize) -> bool {
    matches!(vec_num, 1 | 2 | 4 | 8)
}

/// `vec_num` adjacent pixels of one row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Vector<T> {
    lanes: [T; MAX_VEC_NUM],
    len: usize,
}

impl<T: Copy + Default> Vector<T> {
    /// All-default vector with `len` lanes.
    pub fn zeroed(len: usize) -> Self {
        debug_assert!(len <= MAX_VEC_NUM);
        Self {
            lanes: [T::default(); MAX_VEC_NUM],
            len,
        }
    }

    /// Copies up to [`MAX_VEC_NUM`] lanes from `values`.
    pub fn from_slice(values: &[T]) -> Self {
        let len = values.len().min(MAX_VEC_NUM);
        let mut out = Self::zeroed(len);
        out.lanes[..len].copy_from_slice(&values[..len]);
        out
    }

    /// Lane values.
    pub fn as_slice(&self) -> &[T] {
        &self.lanes[..self.len]
    }

    /// Mutable lane values.
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.lanes[..self.len]
    }

    /// Number of lanes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` when the vector has no lanes.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One output vector with frame markers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StreamElement<T> {
    /// Pixel lanes.
    pub data: Vector<T>,
    /// Set on the first element of a frame.
    pub is_first: bool,
    /// Set on the last element of a frame.
    pub is_last: bool,
}

impl<T: Copy + Default> StreamElement<T> {
    /// Wraps `data` with no frame markers.
    pub fn new(data: Vector<T>) -> Self {
        Self {
            data,
            is_first: false,
            is_last: false,
        }
    }
}

/// Destination for emitted stream elements.
pub trait Sink<T> {
    /// Accepts the next element in stream order.
    fn push(&mut self, element: StreamElement<T>) -> FilterResult<()>;
}

impl<T, S: Sink<T> + ?Sized> Sink<T> for &mut S {
    fn push(&mut self, element: StreamElement<T>) -> FilterResult<()> {
        (**self).push(element)
    }
}

impl<T> Sink<T> for Vec<StreamElement<T>> {
    fn push(&mut self, element: StreamElement<T>) -> FilterResult<()> {
        Vec::push(self, element);
        Ok(())
    }
}

impl<T> Sink<T> for SyncSender<StreamElement<T>> {
    fn push(&mut self, element: StreamElement<T>) -> FilterResult<()> {
        self.send(element).map_err(|_| FilterError::ChannelClosed {
            stage: "downstream receiver dropped".to_string(),
        })
    }
}

/// Sink that drops everything, for unused secondary outputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct Discard;

impl<T> Sink<T> for Discard {
    fn push(&mut self, _element: StreamElement<T>) -> FilterResult<()> {
        Ok(())
    }
}

/// Streams a view as row-major vectors of `vec_num` lanes.
///
/// The caller guarantees `vec_num` divides the width; a trailing partial
/// vector would be truncated.
pub fn vectorize<'a, T: Copy + Default>(
    view: ImageView<'a, T>,
    vec_num: usize,
) -> impl Iterator<Item = Vector<T>> + 'a {
    let vec_num = vec_num.clamp(1, MAX_VEC_NUM);
    (0..view.height())
        .filter_map(move |y| view.row(y))
        .flat_map(move |row| row.chunks_exact(vec_num).map(Vector::from_slice))
}

/// Reassembles a complete frame from emitted elements.
pub fn collect_frame<T, I>(elements: I, width: usize, height: usize) -> FilterResult<OwnedImage<T>>
where
    T: Copy + Default,
    I: IntoIterator<Item = StreamElement<T>>,
{
    let mut data = Vec::with_capacity(width.saturating_mul(height));
    for element in elements {
        data.extend_from_slice(element.data.as_slice());
    }
    OwnedImage::from_vec(data, width, height)
}
