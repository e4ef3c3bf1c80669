//! Per-pixel compositing of the two arranged layers.
//!
//! Each strategy arranges the tiles twice, once with each tile as the base
//! layer, and combines the two canvases pixel by pixel. Outside the overlap
//! both canvases hold the same value, so only the overlap is affected.

use crate::canvas::{arrange, Layer, Shift};
use crate::image::Image;
use crate::util::MosaicResult;

/// Parameters of the alpha blend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AlphaConfig {
    /// Weight of the canvas with the first tile as base layer, in `[0, 1]`.
    pub alpha: f64,
}

impl Default for AlphaConfig {
    fn default() -> Self {
        Self { alpha: 0.4 }
    }
}

/// `alpha * arrange(First) + (1 - alpha) * arrange(Second)`.
pub fn alpha_blend(img1: &Image, img2: &Image, shift: Shift, cfg: &AlphaConfig) -> MosaicResult<Image> {
    let alpha = cfg.alpha;
    combine(img1, img2, shift, |a, b| alpha * a + (1.0 - alpha) * b)
}

/// Pixelwise maximum of the two arranged canvases.
pub fn max_blend(img1: &Image, img2: &Image, shift: Shift) -> MosaicResult<Image> {
    combine(img1, img2, shift, f64::max)
}

/// Pixelwise minimum of the two arranged canvases.
pub fn min_blend(img1: &Image, img2: &Image, shift: Shift) -> MosaicResult<Image> {
    combine(img1, img2, shift, f64::min)
}

fn combine<F>(img1: &Image, img2: &Image, shift: Shift, f: F) -> MosaicResult<Image>
where
    F: Fn(f64, f64) -> f64,
{
    let first = arrange(img1, img2, shift, Layer::First)?.image;
    let second = arrange(img1, img2, shift, Layer::Second)?.image;
    Ok(first.zip_with(&second, f))
}
