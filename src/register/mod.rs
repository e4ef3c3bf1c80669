//! Subpixel translation registration by phase correlation.
//!
//! The integer estimate comes from the peak of the smoothed inverse FFT of
//! the normalized cross-power spectrum. With `upsample_factor > 1` the peak
//! is refined by evaluating a `ceil(2 * upsample_factor)` wide window of the
//! upsampled correlation directly with a matrix-multiply DFT, which gives
//! `1 / upsample_factor` pixel resolution without zero-padding the full
//! spectrum (Guizar-Sicairos, Thurman & Fienup, Opt. Lett. 33, 2008).

mod dft;
mod fft;

pub use fft::Spectrum;

use crate::canvas::Shift;
use crate::image::filter::gaussian_filter_buffer;
use crate::image::Image;
use crate::trace::{trace_event, trace_span};
use crate::util::math::wrap_signed;
use crate::util::{MosaicError, MosaicResult};
use dft::{inverse_dft_at, upsampled_dft};
use rustfft::num_complex::Complex64;

/// Magnitudes below this are treated as empty spectral bins.
const SPECTRUM_EPS: f64 = 1e-300;

/// Axis along which the mosaic grows; the registered shift is kept
/// non-negative along it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ForwardAxis {
    /// Tiles are laid out left to right.
    #[default]
    Horizontal,
    /// Tiles are laid out top to bottom.
    Vertical,
}

/// Inclusive, toroidally wrapped range of correlation locations per axis.
///
/// `rows: Some((-5, 5))` keeps locations `n-5 ..= n-1` and `0 ..= 5`. An axis
/// left as `None` is not restricted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchWindow {
    /// Row (y) range `(start, end)`.
    pub rows: Option<(isize, isize)>,
    /// Column (x) range `(start, end)`.
    pub cols: Option<(isize, isize)>,
}

impl SearchWindow {
    fn allows(range: Option<(isize, isize)>, location: usize, len: usize) -> bool {
        match range {
            None => true,
            Some((start, end)) => {
                let span = (end - start + 1).clamp(0, len as isize);
                (location as isize - start).rem_euclid(len as isize) < span
            }
        }
    }
}

/// Configuration for [`register`].
#[derive(Clone, Debug, PartialEq)]
pub struct RegistrationConfig {
    /// Restricts the peak search to an expected shift range.
    pub search_window: Option<SearchWindow>,
    /// Subpixel resolution is `1 / upsample_factor`; 1 disables refinement.
    pub upsample_factor: usize,
    /// Gaussian sigma applied to the correlation magnitude; 0 disables.
    pub blur_sigma: f64,
    /// Mosaic layout direction used to normalize the sign of the shift.
    pub forward_axis: ForwardAxis,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            search_window: None,
            upsample_factor: 1,
            blur_sigma: 3.0,
            forward_axis: ForwardAxis::Horizontal,
        }
    }
}

/// Outcome of a registration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RegistrationResult {
    /// Shift that registers the target onto the source.
    pub shift: Shift,
    /// Translation-invariant normalized RMS error.
    pub error: f64,
    /// Global phase difference in radians (zero for non-negative images).
    pub phase_diff: f64,
}

/// Data that can enter the registration, either as pixels or as spectra.
pub trait RegistrationInput {
    /// Returns `(height, width)`.
    fn shape(&self) -> (usize, usize);

    /// Largest absolute sample value, used for joint normalization.
    fn max_amplitude(&self) -> f64;

    /// Spectrum of the input after multiplying by `scale`.
    fn to_spectrum(&self, scale: f64) -> Spectrum;
}

impl RegistrationInput for Image {
    fn shape(&self) -> (usize, usize) {
        Image::shape(self)
    }

    fn max_amplitude(&self) -> f64 {
        self.max_abs()
    }

    fn to_spectrum(&self, scale: f64) -> Spectrum {
        Spectrum::forward_scaled(self, scale)
    }
}

impl RegistrationInput for Spectrum {
    fn shape(&self) -> (usize, usize) {
        (self.height(), self.width())
    }

    fn max_amplitude(&self) -> f64 {
        self.data().iter().fold(0.0f64, |acc, c| acc.max(c.norm()))
    }

    fn to_spectrum(&self, scale: f64) -> Spectrum {
        self.scaled(scale)
    }
}

/// Estimates the translation between `src` and `target`.
///
/// Both inputs must have the same shape. Subpixel refinement
/// (`upsample_factor > 1`) needs genuinely two-dimensional data; inputs with
/// a single row or column are rejected with
/// [`MosaicError::UnsupportedDimension`].
pub fn register<I>(src: &I, target: &I, cfg: &RegistrationConfig) -> MosaicResult<RegistrationResult>
where
    I: RegistrationInput + ?Sized,
{
    let (height, width) = src.shape();
    let (target_height, target_width) = target.shape();
    if (height, width) != (target_height, target_width) {
        return Err(MosaicError::ShapeMismatch {
            src_width: width,
            src_height: height,
            target_width,
            target_height,
        });
    }
    if cfg.upsample_factor == 0 {
        return Err(MosaicError::InvalidInput("upsample_factor must be at least 1"));
    }
    if cfg.upsample_factor > 1 && (height < 2 || width < 2) {
        return Err(MosaicError::UnsupportedDimension { width, height });
    }

    let _span = trace_span!(
        "register",
        width = width,
        height = height,
        upsample = cfg.upsample_factor
    )
    .entered();

    let norm = src.max_amplitude().max(target.max_amplitude());
    if !norm.is_finite() || norm <= 0.0 {
        return Err(MosaicError::DegenerateImage {
            reason: "inputs have no finite non-zero amplitude",
        });
    }
    let src_freq = src.to_spectrum(1.0 / norm);
    let target_freq = target.to_spectrum(1.0 / norm);

    let cross: Vec<Complex64> = src_freq
        .data()
        .iter()
        .zip(target_freq.data())
        .map(|(&s, &t)| s * t.conj())
        .collect();
    let product: Vec<Complex64> = src_freq
        .data()
        .iter()
        .zip(target_freq.data())
        .zip(&cross)
        .map(|((s, t), &c)| {
            let denom = s.norm() * t.norm();
            if denom > SPECTRUM_EPS {
                c / denom
            } else {
                Complex64::new(0.0, 0.0)
            }
        })
        .collect();

    let (peak_y, peak_x) = correlation_peak(&product, width, height, cfg);
    trace_event!("correlation_peak", row = peak_y, col = peak_x);
    let mut dy = wrap_signed(peak_y, height);
    let mut dx = wrap_signed(peak_x, width);

    let (src_amp, target_amp) = if cfg.upsample_factor == 1 {
        (
            mean_power(src_freq.data()),
            mean_power(target_freq.data()),
        )
    } else {
        let uf = cfg.upsample_factor as f64;
        (dy, dx) = refine_peak(&product, width, height, uf, dy, dx);
        (
            partial_dft_power(src_freq.data(), width, height, uf),
            partial_dft_power(target_freq.data(), width, height, uf),
        )
    };

    if height == 1 {
        dy = 0.0;
    }
    if width == 1 {
        dx = 0.0;
    }

    let cc_max = inverse_dft_at(&cross, width, height, dy, dx);
    let error = (1.0 - cc_max.norm_sqr() / (src_amp * target_amp)).abs().sqrt();
    let phase_diff = cc_max.im.atan2(cc_max.re);

    match cfg.forward_axis {
        ForwardAxis::Horizontal if dx < 0.0 => dx += width as f64,
        ForwardAxis::Vertical if dy < 0.0 => dy += height as f64,
        _ => {}
    }

    trace_event!("registered", dy = dy, dx = dx, error = error);
    Ok(RegistrationResult {
        shift: Shift::new(dy, dx),
        error,
        phase_diff,
    })
}

/// Integer peak `(row, col)` of the smoothed, windowed correlation magnitude.
fn correlation_peak(
    product: &[Complex64],
    width: usize,
    height: usize,
    cfg: &RegistrationConfig,
) -> (usize, usize) {
    let surface = fft::ifft2(product, width, height);
    let magnitude: Vec<f64> = surface.iter().map(|c| c.norm()).collect();
    let mut smoothed = gaussian_filter_buffer(&magnitude, width, height, cfg.blur_sigma);

    if let Some(window) = cfg.search_window {
        for y in 0..height {
            let row_ok = SearchWindow::allows(window.rows, y, height);
            for x in 0..width {
                if !row_ok || !SearchWindow::allows(window.cols, x, width) {
                    smoothed[y * width + x] = 0.0;
                }
            }
        }
    }

    let idx = argmax(smoothed.iter().map(|v| v.abs()));
    (idx / width, idx % width)
}

/// Refines an integer estimate on the `1 / uf` grid around it.
fn refine_peak(product: &[Complex64], width: usize, height: usize, uf: f64, dy: f64, dx: f64) -> (f64, f64) {
    let dy = (dy * uf).round() / uf;
    let dx = (dx * uf).round() / uf;
    let region = (uf * 2.0).ceil() as usize;
    let dftshift = (region / 2) as f64;
    let normalization = (width * height) as f64 * uf * uf;

    let conj: Vec<Complex64> = product.iter().map(|c| c.conj()).collect();
    let upsampled = upsampled_dft(
        &conj,
        width,
        height,
        (region, region),
        uf,
        (dftshift - dy * uf, dftshift - dx * uf),
    );
    let idx = argmax(upsampled.iter().map(|c| (c.conj() / normalization).norm()));
    let (row, col) = (idx / region, idx % region);
    trace_event!("subpixel_peak", row = row, col = col);

    (
        dy + (row as f64 - dftshift) / uf,
        dx + (col as f64 - dftshift) / uf,
    )
}

fn mean_power(spectrum: &[Complex64]) -> f64 {
    spectrum.iter().map(|c| c.norm_sqr()).sum::<f64>() / spectrum.len() as f64
}

/// Mean spectral power evaluated as a 1x1 partial DFT at the origin.
fn partial_dft_power(spectrum: &[Complex64], width: usize, height: usize, uf: f64) -> f64 {
    let power: Vec<Complex64> = spectrum.iter().map(|&c| c * c.conj()).collect();
    let value = upsampled_dft(&power, width, height, (1, 1), uf, (0.0, 0.0))[0];
    value.re / (width * height) as f64
}

/// Index of the first maximum, matching row-major scan order.
fn argmax<I: Iterator<Item = f64>>(values: I) -> usize {
    let mut best = 0;
    let mut best_value = f64::NEG_INFINITY;
    for (idx, value) in values.enumerate() {
        if value > best_value {
            best = idx;
            best_value = value;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::{argmax, SearchWindow};

    #[test]
    fn argmax_keeps_the_first_tie() {
        assert_eq!(argmax([1.0, 3.0, 3.0, 2.0].into_iter()), 1);
    }

    #[test]
    fn search_window_wraps_negative_starts() {
        let range = Some((-2, 1));
        let allowed: Vec<usize> = (0..8)
            .filter(|&loc| SearchWindow::allows(range, loc, 8))
            .collect();
        assert_eq!(allowed, vec![0, 1, 6, 7]);
    }

    #[test]
    fn search_window_caps_at_axis_length() {
        assert!((0..4).all(|loc| SearchWindow::allows(Some((0, 100)), loc, 4)));
    }
}
