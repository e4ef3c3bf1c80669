//! 2D FFT by row-column decomposition on top of `rustfft`.

use crate::image::Image;
use crate::util::{MosaicError, MosaicResult};
#[cfg(feature = "rayon")]
use rayon::prelude::*;
use rustfft::num_complex::Complex64;
use rustfft::{FftDirection, FftPlanner};

/// Complex 2D spectrum stored row-major (`height` rows of `width` bins).
#[derive(Clone, Debug, PartialEq)]
pub struct Spectrum {
    data: Vec<Complex64>,
    width: usize,
    height: usize,
}

impl Spectrum {
    /// Wraps frequency-domain data, e.g. spectra computed by the caller.
    pub fn from_vec(data: Vec<Complex64>, width: usize, height: usize) -> MosaicResult<Self> {
        if width == 0 || height == 0 {
            return Err(MosaicError::InvalidDimensions { width, height });
        }
        let needed = width
            .checked_mul(height)
            .ok_or(MosaicError::InvalidDimensions { width, height })?;
        if data.len() != needed {
            return Err(MosaicError::BufferTooSmall {
                needed,
                got: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
        })
    }

    /// Forward transform of an image; invalid pixels contribute zero.
    pub fn forward(image: &Image) -> Self {
        Self::forward_scaled(image, 1.0)
    }

    pub(crate) fn forward_scaled(image: &Image, scale: f64) -> Self {
        let mut data: Vec<Complex64> = image
            .data()
            .iter()
            .map(|&v| Complex64::new(v * scale, 0.0))
            .collect();
        fft2(&mut data, image.width(), image.height(), FftDirection::Forward);
        Self {
            data,
            width: image.width(),
            height: image.height(),
        }
    }

    /// Inverse transform, normalized by the number of samples.
    pub fn inverse(&self) -> Vec<Complex64> {
        ifft2(&self.data, self.width, self.height)
    }

    /// Returns the number of frequency columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns the number of frequency rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Returns the bins in row-major order.
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    pub(crate) fn scaled(&self, scale: f64) -> Self {
        Self {
            data: self.data.iter().map(|&c| c * scale).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

/// Normalized inverse 2D FFT.
pub(crate) fn ifft2(data: &[Complex64], width: usize, height: usize) -> Vec<Complex64> {
    let mut work = data.to_vec();
    fft2(&mut work, width, height, FftDirection::Inverse);
    let norm = 1.0 / (width * height) as f64;
    for c in &mut work {
        *c *= norm;
    }
    work
}

/// Unnormalized in-place 2D FFT.
pub(crate) fn fft2(data: &mut [Complex64], width: usize, height: usize, direction: FftDirection) {
    let mut planner = FftPlanner::<f64>::new();
    let row_fft = planner.plan_fft(width, direction);
    let col_fft = planner.plan_fft(height, direction);

    #[cfg(feature = "rayon")]
    data.par_chunks_mut(width).for_each(|row| row_fft.process(row));
    #[cfg(not(feature = "rayon"))]
    data.chunks_mut(width).for_each(|row| row_fft.process(row));

    // Columns are transformed as rows of the transpose.
    let mut columns = transpose(data, width, height);
    #[cfg(feature = "rayon")]
    columns
        .par_chunks_mut(height)
        .for_each(|col| col_fft.process(col));
    #[cfg(not(feature = "rayon"))]
    columns
        .chunks_mut(height)
        .for_each(|col| col_fft.process(col));

    let back = transpose(&columns, height, width);
    data.copy_from_slice(&back);
}

fn transpose(data: &[Complex64], width: usize, height: usize) -> Vec<Complex64> {
    let mut out = vec![Complex64::new(0.0, 0.0); data.len()];
    for y in 0..height {
        for x in 0..width {
            out[x * height + y] = data[y * width + x];
        }
    }
    out
}
