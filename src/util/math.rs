//! Mathematical helpers for filtering and correlation.

/// Truncation of the Gaussian kernel in standard deviations.
const GAUSSIAN_TRUNCATE: f64 = 4.0;

/// Maps an out-of-range index onto `[0, len)` by half-sample symmetric
/// reflection (`d c b a | a b c d | d c b a`).
pub(crate) fn reflect_index(index: isize, len: usize) -> usize {
    debug_assert!(len > 0);
    let period = 2 * len as isize;
    let m = index.rem_euclid(period) as usize;
    if m >= len {
        2 * len - 1 - m
    } else {
        m
    }
}

/// Builds a normalized 1D Gaussian kernel truncated at four sigmas.
///
/// Returns a single unit tap for non-positive or non-finite sigmas.
pub(crate) fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (GAUSSIAN_TRUNCATE * sigma + 0.5) as isize;
    let denom = -0.5 / (sigma * sigma);
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (denom * (x * x) as f64).exp())
        .collect();
    let sum: f64 = kernel.iter().sum();
    for tap in &mut kernel {
        *tap /= sum;
    }
    kernel
}

/// Burt–Adelson 5-tap generating kernel `[1/4 - a/2, 1/4, a, 1/4, 1/4 - a/2]`.
pub(crate) fn generating_kernel(a: f64) -> [f64; 5] {
    let edge = 0.25 - a / 2.0;
    [edge, 0.25, a, 0.25, edge]
}

/// Converts a periodic FFT location into a signed offset.
///
/// Locations strictly past `floor(len / 2)` wrap to negative values.
pub(crate) fn wrap_signed(location: usize, len: usize) -> f64 {
    if location > len / 2 {
        location as f64 - len as f64
    } else {
        location as f64
    }
}

/// Signed frequency of FFT bin `k` for a transform of length `len`.
pub(crate) fn signed_frequency(k: usize, len: usize) -> f64 {
    let half = len / 2;
    ((k + half) % len) as f64 - half as f64
}
