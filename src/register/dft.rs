//! Partial DFT evaluation by matrix multiplication.
//!
//! Evaluates a small `rows x cols` window of the DFT of a spectrum as if the
//! spectrum had been zero-padded `upsample` times, without ever building the
//! padded array. Row index `j` of the output samples position
//! `(j - offset) / upsample` of the original grid.

use crate::util::math::signed_frequency;
use rustfft::num_complex::Complex64;
use std::f64::consts::TAU;

/// Upsampled DFT of `data` (`height x width`) over a `region` of
/// `(rows, cols)` samples starting at `offsets = (row_offset, col_offset)`.
///
/// Returns a row-major `rows x cols` buffer.
pub(crate) fn upsampled_dft(
    data: &[Complex64],
    width: usize,
    height: usize,
    region: (usize, usize),
    upsample: f64,
    offsets: (f64, f64),
) -> Vec<Complex64> {
    let (rows, cols) = region;
    let (row_offset, col_offset) = offsets;

    // row_kernel: rows x height
    let row_scale = -TAU / (height as f64 * upsample);
    let mut row_kernel = Vec::with_capacity(rows * height);
    for j in 0..rows {
        let pos = j as f64 - row_offset;
        for k in 0..height {
            let phase = row_scale * pos * signed_frequency(k, height);
            row_kernel.push(Complex64::from_polar(1.0, phase));
        }
    }

    // col_kernel: width x cols
    let col_scale = -TAU / (width as f64 * upsample);
    let mut col_kernel = Vec::with_capacity(width * cols);
    for k in 0..width {
        let freq = signed_frequency(k, width);
        for l in 0..cols {
            let phase = col_scale * freq * (l as f64 - col_offset);
            col_kernel.push(Complex64::from_polar(1.0, phase));
        }
    }

    // tmp = row_kernel * data: rows x width
    let zero = Complex64::new(0.0, 0.0);
    let mut tmp = vec![zero; rows * width];
    for j in 0..rows {
        let acc = &mut tmp[j * width..(j + 1) * width];
        for k in 0..height {
            let weight = row_kernel[j * height + k];
            let src = &data[k * width..(k + 1) * width];
            for (a, &s) in acc.iter_mut().zip(src) {
                *a += weight * s;
            }
        }
    }

    // out = tmp * col_kernel: rows x cols
    let mut out = vec![zero; rows * cols];
    for j in 0..rows {
        let dst = &mut out[j * cols..(j + 1) * cols];
        for k in 0..width {
            let t = tmp[j * width + k];
            let kernel_row = &col_kernel[k * cols..(k + 1) * cols];
            for (o, &c) in dst.iter_mut().zip(kernel_row) {
                *o += t * c;
            }
        }
    }
    out
}

/// Inverse DFT of `data` evaluated at the (possibly fractional) position
/// `(dy, dx)`, normalized by the number of samples.
pub(crate) fn inverse_dft_at(data: &[Complex64], width: usize, height: usize, dy: f64, dx: f64) -> Complex64 {
    let conj: Vec<Complex64> = data.iter().map(|c| c.conj()).collect();
    let value = upsampled_dft(&conj, width, height, (1, 1), 1.0, (-dy, -dx))[0].conj();
    value / (width * height) as f64
}

#[cfg(test)]
mod tests {
    use super::{inverse_dft_at, upsampled_dft};
    use crate::image::Image;
    use crate::register::fft::Spectrum;
    use rustfft::num_complex::Complex64;

    #[test]
    fn unit_upsampling_reproduces_the_full_dft() {
        let img = Image::from_fn(5, 4, |x, y| ((x * 3 + y * 5) % 7) as f64).unwrap();
        let spec = Spectrum::forward(&img);
        let data: Vec<Complex64> = img.data().iter().map(|&v| Complex64::new(v, 0.0)).collect();
        let dft = upsampled_dft(&data, 5, 4, (4, 5), 1.0, (0.0, 0.0));
        for (a, b) in dft.iter().zip(spec.data()) {
            assert!((*a - *b).norm() < 1e-9);
        }
    }

    #[test]
    fn inverse_dft_at_integer_points_matches_samples() {
        let img = Image::from_fn(6, 4, |x, y| (x as f64 + 1.0) * (y as f64 - 0.5)).unwrap();
        let spec = Spectrum::forward(&img);
        let value = inverse_dft_at(spec.data(), 6, 4, 2.0, 3.0);
        assert!((value.re - img.at(3, 2)).abs() < 1e-9);
        assert!(value.im.abs() < 1e-9);
    }
}
