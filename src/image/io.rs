//! Grayscale image files via the `image` crate.
//!
//! Available when the `image-io` feature is enabled.

use crate::image::Image;
use crate::util::{MosaicError, MosaicResult};
use std::path::Path;

/// Creates a fully valid image from a 16-bit grayscale buffer.
pub fn image_from_gray16(img: &image::ImageBuffer<image::Luma<u16>, Vec<u16>>) -> MosaicResult<Image> {
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img.as_raw().iter().map(|&v| f64::from(v)).collect();
    Image::from_vec(data, width, height)
}

/// Loads an image from disk and converts it to grayscale samples.
pub fn load_gray_image<P: AsRef<Path>>(path: P) -> MosaicResult<Image> {
    let img = image::open(path).map_err(|err| MosaicError::ImageIo {
        reason: err.to_string(),
    })?;
    image_from_gray16(&img.to_luma16())
}

/// Rescales the valid range of `img` onto `0..=65535`; invalid pixels map
/// to zero.
pub fn to_gray16(img: &Image) -> MosaicResult<image::ImageBuffer<image::Luma<u16>, Vec<u16>>> {
    let (lo, hi) = (0..img.height())
        .flat_map(|y| (0..img.width()).filter_map(move |x| img.get(x, y)))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    let span = if hi > lo { hi - lo } else { 1.0 };

    let mut pixels = Vec::with_capacity(img.width() * img.height());
    for y in 0..img.height() {
        for x in 0..img.width() {
            let value = img.get(x, y).map_or(0.0, |v| (v - lo) / span * f64::from(u16::MAX));
            pixels.push(value.round().clamp(0.0, f64::from(u16::MAX)) as u16);
        }
    }
    let width = u32::try_from(img.width()).map_err(|_| MosaicError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    let height = u32::try_from(img.height()).map_err(|_| MosaicError::InvalidDimensions {
        width: img.width(),
        height: img.height(),
    })?;
    image::ImageBuffer::from_raw(width, height, pixels).ok_or(MosaicError::BufferTooSmall {
        needed: img.width() * img.height(),
        got: 0,
    })
}

/// Writes `img` as a 16-bit grayscale file; the format follows the extension.
pub fn save_gray_image<P: AsRef<Path>>(path: P, img: &Image) -> MosaicResult<()> {
    to_gray16(img)?.save(path).map_err(|err| MosaicError::ImageIo {
        reason: err.to_string(),
    })
}
