//! Grayscale image loading and saving through the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::{ImageView, OwnedImage};
use crate::util::{FilterError, FilterResult};
use image::{GrayImage, ImageBuffer, Luma};
use std::path::Path;

fn io_error(err: image::ImageError) -> FilterError {
    FilterError::ImageIo {
        reason: err.to_string(),
    }
}

/// Creates a borrowed view from an 8-bit grayscale buffer.
pub fn view_from_gray_image(img: &GrayImage) -> FilterResult<ImageView<'_, u8>> {
    ImageView::from_slice(img.as_raw(), img.width() as usize, img.height() as usize)
}

/// Loads an image from disk as 8-bit luminance.
pub fn load_gray_u8<P: AsRef<Path>>(path: P) -> FilterResult<OwnedImage<u8>> {
    let img = image::open(path).map_err(io_error)?.to_luma8();
    let (width, height) = (img.width() as usize, img.height() as usize);
    OwnedImage::from_vec(img.into_raw(), width, height)
}

/// Loads an image from disk as 16-bit luminance.
pub fn load_gray_u16<P: AsRef<Path>>(path: P) -> FilterResult<OwnedImage<u16>> {
    let img = image::open(path).map_err(io_error)?.to_luma16();
    let (width, height) = (img.width() as usize, img.height() as usize);
    OwnedImage::from_vec(img.into_raw(), width, height)
}

/// Writes an 8-bit image; the format follows the path extension.
pub fn save_gray_u8<P: AsRef<Path>>(path: P, img: &OwnedImage<u8>) -> FilterResult<()> {
    let buffer = to_buffer::<u8>(img)?;
    buffer.save(path).map_err(io_error)
}

/// Writes a 16-bit image; the format follows the path extension.
pub fn save_gray_u16<P: AsRef<Path>>(path: P, img: &OwnedImage<u16>) -> FilterResult<()> {
    let buffer = to_buffer::<u16>(img)?;
    buffer.save(path).map_err(io_error)
}

fn to_buffer<T>(img: &OwnedImage<T>) -> FilterResult<ImageBuffer<Luma<T>, Vec<T>>>
where
    T: image::Primitive + Copy,
{
    let (width, height) = (img.width(), img.height());
    let dims = u32::try_from(width)
        .ok()
        .zip(u32::try_from(height).ok())
        .ok_or(FilterError::InvalidDimensions { width, height })?;
    ImageBuffer::from_raw(dims.0, dims.1, img.data().to_vec())
        .ok_or(FilterError::InvalidDimensions { width, height })
}
