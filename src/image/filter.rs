//! Separable filtering with half-sample symmetric boundaries.
//!
//! Both passes mirror the signal at its edges (`d c b a | a b c d`), which is
//! the boundary used for the Gaussian smoothing of correlation surfaces and
//! blend masks as well as for the pyramid generating kernel.

use crate::image::Image;
use crate::util::math::{gaussian_kernel_1d, generating_kernel, reflect_index};
#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Smooths an image with an isotropic Gaussian of standard deviation `sigma`.
///
/// Invalid pixels contribute their stored zero; the result is fully valid.
/// Non-positive sigmas return a plain copy.
pub fn gaussian_filter(image: &Image, sigma: f64) -> Image {
    let data = gaussian_filter_buffer(image.data(), image.width(), image.height(), sigma);
    Image::dense(data, image.width(), image.height())
}

/// Applies the 5-tap generating kernel with parameter `a` along both axes.
pub fn generating_filter(image: &Image, a: f64) -> Image {
    let kernel = generating_kernel(a);
    let data = separable(image.data(), image.width(), image.height(), &kernel);
    Image::dense(data, image.width(), image.height())
}

pub(crate) fn gaussian_filter_buffer(
    data: &[f64],
    width: usize,
    height: usize,
    sigma: f64,
) -> Vec<f64> {
    let kernel = gaussian_kernel_1d(sigma);
    if kernel.len() == 1 {
        return data.to_vec();
    }
    separable(data, width, height, &kernel)
}

fn separable(data: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let rows = filter_rows(data, width, kernel);
    filter_cols(&rows, width, height, kernel)
}

fn filter_rows(src: &[f64], width: usize, kernel: &[f64]) -> Vec<f64> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = vec![0.0f64; src.len()];
    let row_pass = |(src_row, dst_row): (&[f64], &mut [f64])| {
        for (x, dst) in dst_row.iter_mut().enumerate() {
            let mut acc = 0.0;
            for (j, &k) in kernel.iter().enumerate() {
                let sx = reflect_index(x as isize + j as isize - radius, width);
                acc += k * src_row[sx];
            }
            *dst = acc;
        }
    };

    #[cfg(feature = "rayon")]
    src.par_chunks(width)
        .zip(out.par_chunks_mut(width))
        .for_each(row_pass);
    #[cfg(not(feature = "rayon"))]
    src.chunks(width).zip(out.chunks_mut(width)).for_each(row_pass);

    out
}

fn filter_cols(src: &[f64], width: usize, height: usize, kernel: &[f64]) -> Vec<f64> {
    let radius = (kernel.len() / 2) as isize;
    let mut out = vec![0.0f64; src.len()];
    let col_pass = |(y, dst_row): (usize, &mut [f64])| {
        for (j, &k) in kernel.iter().enumerate() {
            let sy = reflect_index(y as isize + j as isize - radius, height);
            let src_row = &src[sy * width..(sy + 1) * width];
            for (dst, &s) in dst_row.iter_mut().zip(src_row) {
                *dst += k * s;
            }
        }
    };

    #[cfg(feature = "rayon")]
    out.par_chunks_mut(width).enumerate().for_each(col_pass);
    #[cfg(not(feature = "rayon"))]
    out.chunks_mut(width).enumerate().for_each(col_pass);

    out
}

#[cfg(test)]
mod tests {
    use super::{gaussian_filter, generating_filter};
    use crate::image::Image;

    #[test]
    fn gaussian_preserves_constant_images() {
        let img = Image::from_vec(vec![2.5; 7 * 5], 7, 5).unwrap();
        let out = gaussian_filter(&img, 3.0);
        for &v in out.data() {
            assert!((v - 2.5).abs() < 1e-12);
        }
    }

    #[test]
    fn gaussian_preserves_mass_in_the_interior() {
        let mut data = vec![0.0; 41 * 41];
        data[20 * 41 + 20] = 1.0;
        let img = Image::from_vec(data, 41, 41).unwrap();
        let out = gaussian_filter(&img, 2.0);
        let sum: f64 = out.data().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
        let peak = out.data()[20 * 41 + 20];
        assert!(out.data().iter().all(|&v| v <= peak));
    }

    #[test]
    fn generating_filter_matches_hand_computed_row() {
        let img = Image::from_vec(vec![0.0, 0.0, 4.0, 0.0, 0.0], 5, 1).unwrap();
        let out = generating_filter(&img, 0.5);
        let expected = [0.0, 1.0, 2.0, 1.0, 0.0];
        for (got, want) in out.data().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }
}
