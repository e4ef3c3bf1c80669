//! Owned single-channel images with an explicit validity mask.
//!
//! Tiles and canvases are stored row-major as `f64`. Pixels that carry no
//! data (outside a tile footprint, or masked out by the instrument) are
//! tracked in a boolean mask instead of a NaN sentinel; their stored value is
//! always `0.0`. An image without a mask is fully valid.

use crate::util::{MosaicError, MosaicResult};

pub mod filter;
#[cfg(feature = "image-io")]
pub mod io;
pub mod pyramid;

/// Owned row-major image buffer with optional validity mask.
#[derive(Clone, Debug)]
pub struct Image {
    data: Vec<f64>,
    valid: Option<Vec<bool>>,
    width: usize,
    height: usize,
}

impl Image {
    /// Creates a fully valid image from a contiguous buffer.
    pub fn from_vec(data: Vec<f64>, width: usize, height: usize) -> MosaicResult<Self> {
        let needed = required_len(width, height)?;
        check_len(data.len(), needed, width, height)?;
        Ok(Self {
            data,
            valid: None,
            width,
            height,
        })
    }

    /// Creates an image whose pixels are valid where `valid` is `true`.
    ///
    /// Values under invalid pixels are reset to zero.
    pub fn with_validity(
        mut data: Vec<f64>,
        valid: Vec<bool>,
        width: usize,
        height: usize,
    ) -> MosaicResult<Self> {
        let needed = required_len(width, height)?;
        check_len(data.len(), needed, width, height)?;
        check_len(valid.len(), needed, width, height)?;
        for (value, &ok) in data.iter_mut().zip(&valid) {
            if !ok {
                *value = 0.0;
            }
        }
        let valid = if valid.iter().all(|&ok| ok) {
            None
        } else {
            Some(valid)
        };
        Ok(Self {
            data,
            valid,
            width,
            height,
        })
    }

    /// Creates an image from a buffer that marks missing data with NaN.
    pub fn from_nan_sentinel(data: Vec<f64>, width: usize, height: usize) -> MosaicResult<Self> {
        let valid = data.iter().map(|v| !v.is_nan()).collect();
        Self::with_validity(data, valid, width, height)
    }

    /// Creates a fully valid image by evaluating `f(x, y)` for every pixel.
    pub fn from_fn<F>(width: usize, height: usize, mut f: F) -> MosaicResult<Self>
    where
        F: FnMut(usize, usize) -> f64,
    {
        let needed = required_len(width, height)?;
        let mut data = Vec::with_capacity(needed);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self::from_vec(data, width, height)
    }

    /// Creates a fully invalid image of the given size.
    pub fn empty(width: usize, height: usize) -> MosaicResult<Self> {
        let needed = required_len(width, height)?;
        Ok(Self {
            data: vec![0.0; needed],
            valid: Some(vec![false; needed]),
            width,
            height,
        })
    }

    /// Wraps a buffer whose length is already known to match.
    pub(crate) fn dense(data: Vec<f64>, width: usize, height: usize) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self {
            data,
            valid: None,
            width,
            height,
        }
    }

    /// Returns the image width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the image height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns `(height, width)`, matching row-major array shape order.
    pub fn shape(&self) -> (usize, usize) {
        (self.height, self.width)
    }

    /// Returns the pixel values in row-major order; invalid pixels read zero.
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Returns the validity mask, or `None` when every pixel is valid.
    pub fn validity(&self) -> Option<&[bool]> {
        self.valid.as_deref()
    }

    /// Returns `true` when every pixel holds data.
    pub fn is_fully_valid(&self) -> bool {
        self.valid
            .as_ref()
            .map_or(true, |mask| mask.iter().all(|&ok| ok))
    }

    /// Number of pixels that hold data.
    pub fn valid_count(&self) -> usize {
        self.valid
            .as_ref()
            .map_or(self.data.len(), |mask| mask.iter().filter(|&&ok| ok).count())
    }

    /// Returns the value at `(x, y)` if it is in bounds and valid.
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = y * self.width + x;
        if self.valid.as_ref().is_some_and(|mask| !mask[idx]) {
            return None;
        }
        Some(self.data[idx])
    }

    /// Returns `true` if `(x, y)` is in bounds and holds data.
    pub fn is_valid(&self, x: usize, y: usize) -> bool {
        self.get(x, y).is_some()
    }

    /// Returns row `y` of raw values.
    pub fn row(&self, y: usize) -> Option<&[f64]> {
        if y >= self.height {
            return None;
        }
        let start = y * self.width;
        self.data.get(start..start + self.width)
    }

    /// Raw value at `(x, y)`; invalid pixels read zero.
    pub(crate) fn at(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    /// Writes a valid value at `(x, y)`.
    pub(crate) fn set(&mut self, x: usize, y: usize, value: f64) {
        let idx = y * self.width + x;
        self.data[idx] = value;
        if let Some(mask) = self.valid.as_mut() {
            mask[idx] = true;
        }
    }

    /// Combines two same-shaped images pixel by pixel.
    ///
    /// Where both pixels are valid the result is `f(a, b)`; where only one
    /// is valid its value passes through; elsewhere the result is invalid.
    pub(crate) fn zip_with<F>(&self, other: &Image, f: F) -> Image
    where
        F: Fn(f64, f64) -> f64,
    {
        debug_assert_eq!(self.shape(), other.shape());
        let len = self.data.len();
        let mut data = Vec::with_capacity(len);
        let mut valid = Vec::with_capacity(len);
        for idx in 0..len {
            let a = self.valid.as_ref().map_or(true, |mask| mask[idx]);
            let b = other.valid.as_ref().map_or(true, |mask| mask[idx]);
            let value = match (a, b) {
                (true, true) => f(self.data[idx], other.data[idx]),
                (true, false) => self.data[idx],
                (false, true) => other.data[idx],
                (false, false) => 0.0,
            };
            data.push(value);
            valid.push(a || b);
        }
        let valid = if valid.iter().all(|&ok| ok) {
            None
        } else {
            Some(valid)
        };
        Image {
            data,
            valid,
            width: self.width,
            height: self.height,
        }
    }

    /// Largest absolute value among valid pixels.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0f64, |acc, v| acc.max(v.abs()))
    }

    /// Returns the values with invalid pixels replaced by NaN.
    pub fn to_nan_filled(&self) -> Vec<f64> {
        match &self.valid {
            None => self.data.clone(),
            Some(mask) => self
                .data
                .iter()
                .zip(mask)
                .map(|(&v, &ok)| if ok { v } else { f64::NAN })
                .collect(),
        }
    }

    /// Returns a fully valid copy with invalid pixels set to `fill`.
    pub fn filled(&self, fill: f64) -> Image {
        let data = match &self.valid {
            None => self.data.clone(),
            Some(mask) => self
                .data
                .iter()
                .zip(mask)
                .map(|(&v, &ok)| if ok { v } else { fill })
                .collect(),
        };
        Image::dense(data, self.width, self.height)
    }

    /// Copies a rectangular region, keeping its validity.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> MosaicResult<Image> {
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidDimensions { width, height });
        }
        let out_of_bounds = MosaicError::RoiOutOfBounds {
            x,
            y,
            width,
            height,
            img_width: self.width,
            img_height: self.height,
        };
        let end_x = x.checked_add(width).ok_or(out_of_bounds.clone())?;
        let end_y = y.checked_add(height).ok_or(out_of_bounds.clone())?;
        if end_x > self.width || end_y > self.height {
            return Err(out_of_bounds);
        }

        let mut data = Vec::with_capacity(width * height);
        let mut valid = Vec::with_capacity(width * height);
        for row in y..end_y {
            let start = row * self.width + x;
            data.extend_from_slice(&self.data[start..start + width]);
            match &self.valid {
                None => valid.extend(std::iter::repeat(true).take(width)),
                Some(mask) => valid.extend_from_slice(&mask[start..start + width]),
            }
        }
        Image::with_validity(data, valid, width, height)
    }

    /// Copies `src` into this image with its top-left corner at `(x, y)`.
    ///
    /// Only valid source pixels are written; the written pixels become
    /// valid. Source pixels falling outside this image are skipped.
    pub(crate) fn paste_valid(&mut self, src: &Image, x: usize, y: usize) {
        for sy in 0..src.height {
            let ty = y + sy;
            if ty >= self.height {
                break;
            }
            for sx in 0..src.width {
                let tx = x + sx;
                if tx >= self.width {
                    break;
                }
                if let Some(value) = src.get(sx, sy) {
                    self.set(tx, ty, value);
                }
            }
        }
    }
}

impl PartialEq for Image {
    /// Images are equal when they share a shape, values and valid pixels; a
    /// missing mask equals an all-true mask.
    fn eq(&self, other: &Self) -> bool {
        if self.width != other.width || self.height != other.height || self.data != other.data {
            return false;
        }
        match (&self.valid, &other.valid) {
            (None, None) => true,
            (Some(a), Some(b)) => a == b,
            (Some(mask), None) | (None, Some(mask)) => mask.iter().all(|&ok| ok),
        }
    }
}

fn required_len(width: usize, height: usize) -> MosaicResult<usize> {
    if width == 0 || height == 0 {
        return Err(MosaicError::InvalidDimensions { width, height });
    }
    width
        .checked_mul(height)
        .ok_or(MosaicError::InvalidDimensions { width, height })
}

fn check_len(got: usize, needed: usize, width: usize, height: usize) -> MosaicResult<()> {
    if got < needed {
        return Err(MosaicError::BufferTooSmall { needed, got });
    }
    if got > needed {
        return Err(MosaicError::InvalidDimensions { width, height });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::Image;
    use crate::util::MosaicError;

    #[test]
    fn nan_sentinel_becomes_invalid_zero() {
        let img = Image::from_nan_sentinel(vec![1.0, f64::NAN, 3.0, 4.0], 2, 2).unwrap();
        assert_eq!(img.get(1, 0), None);
        assert_eq!(img.data()[1], 0.0);
        assert_eq!(img.get(0, 1), Some(3.0));
        assert!(img.to_nan_filled()[1].is_nan());
    }

    #[test]
    fn all_valid_mask_is_dropped() {
        let img = Image::with_validity(vec![1.0; 4], vec![true; 4], 2, 2).unwrap();
        assert!(img.is_fully_valid());
        assert_eq!(img, Image::from_vec(vec![1.0; 4], 2, 2).unwrap());
    }

    #[test]
    fn crop_rejects_out_of_bounds() {
        let img = Image::from_fn(4, 3, |x, y| (x + 10 * y) as f64).unwrap();
        let roi = img.crop(1, 1, 2, 2).unwrap();
        assert_eq!(roi.data(), &[11.0, 12.0, 21.0, 22.0]);
        let err = img.crop(3, 2, 2, 2).unwrap_err();
        assert!(matches!(err, MosaicError::RoiOutOfBounds { .. }));
    }

    #[test]
    fn paste_skips_invalid_source_pixels() {
        let mut canvas = Image::empty(3, 2).unwrap();
        let src = Image::from_nan_sentinel(vec![1.0, f64::NAN], 2, 1).unwrap();
        canvas.paste_valid(&src, 1, 1);
        assert_eq!(canvas.get(1, 1), Some(1.0));
        assert_eq!(canvas.get(2, 1), None);
        assert_eq!(canvas.get(0, 0), None);
    }
}
