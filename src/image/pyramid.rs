//! Gaussian and Laplacian pyramids for multiresolution blending.
//!
//! Reduction filters with the Burt–Adelson 5-tap generating kernel and keeps
//! even-indexed rows and columns, so a level of size `n` reduces to
//! `ceil(n / 2)`. Expansion zero-stuffs to twice the size, filters with the
//! same kernel and applies a gain of 4; when that overshoots an odd-sized
//! finer level, the trailing row or column is trimmed.

use crate::image::filter::generating_filter;
use crate::image::Image;

/// Filters `level` with the generating kernel and keeps even rows/columns.
pub fn reduce(level: &Image, blur: f64) -> Image {
    let filtered = generating_filter(level, blur);
    let width = level.width().div_ceil(2);
    let height = level.height().div_ceil(2);
    let mut data = Vec::with_capacity(width * height);
    for y in (0..level.height()).step_by(2) {
        for x in (0..level.width()).step_by(2) {
            data.push(filtered.at(x, y));
        }
    }
    Image::dense(data, width, height)
}

/// Upsamples `level` by two and trims the result to `width x height`.
///
/// `width` and `height` must not exceed twice the level size.
pub fn expand(level: &Image, blur: f64, width: usize, height: usize) -> Image {
    let up_width = level.width() * 2;
    let up_height = level.height() * 2;
    debug_assert!(width <= up_width && height <= up_height);

    let mut stuffed = vec![0.0f64; up_width * up_height];
    for y in 0..level.height() {
        for x in 0..level.width() {
            stuffed[2 * y * up_width + 2 * x] = level.at(x, y);
        }
    }
    let filtered = generating_filter(&Image::dense(stuffed, up_width, up_height), blur);

    let mut data = Vec::with_capacity(width * height);
    for y in 0..height {
        for x in 0..width {
            data.push(4.0 * filtered.at(x, y));
        }
    }
    Image::dense(data, width, height)
}

/// Successively reduced copies of an image; level 0 is full resolution.
#[derive(Clone, Debug)]
pub struct GaussianPyramid {
    levels: Vec<Image>,
}

impl GaussianPyramid {
    /// Builds `depth` reductions on top of `base` (so `depth + 1` levels).
    ///
    /// Invalid pixels of `base` contribute their stored zero.
    pub fn build(base: &Image, depth: usize, blur: f64) -> Self {
        let mut levels = Vec::with_capacity(depth + 1);
        levels.push(base.filled(0.0));
        for _ in 0..depth {
            let next = reduce(levels.last().expect("levels is not empty"), blur);
            levels.push(next);
        }
        Self { levels }
    }

    /// Returns all levels (level 0 is the base resolution).
    pub fn levels(&self) -> &[Image] {
        &self.levels
    }

    /// Returns a specific level.
    pub fn level(&self, index: usize) -> Option<&Image> {
        self.levels.get(index)
    }

    /// Number of levels including the base.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Always `false`; a pyramid holds at least its base level.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Band-pass residuals of a Gaussian pyramid plus its coarsest level.
#[derive(Clone, Debug)]
pub struct LaplacianPyramid {
    levels: Vec<Image>,
    blur: f64,
}

impl LaplacianPyramid {
    /// Derives residuals `G_i - expand(G_{i+1})`; the last level is copied.
    pub fn from_gaussian(gauss: &GaussianPyramid, blur: f64) -> Self {
        let src = gauss.levels();
        let mut levels = Vec::with_capacity(src.len());
        for pair in src.windows(2) {
            let (fine, coarse) = (&pair[0], &pair[1]);
            let up = expand(coarse, blur, fine.width(), fine.height());
            let data = fine
                .data()
                .iter()
                .zip(up.data())
                .map(|(g, e)| g - e)
                .collect();
            levels.push(Image::dense(data, fine.width(), fine.height()));
        }
        if let Some(coarsest) = src.last() {
            levels.push(coarsest.clone());
        }
        Self { levels, blur }
    }

    /// Convenience for `from_gaussian(GaussianPyramid::build(..))`.
    pub fn build(base: &Image, depth: usize, blur: f64) -> Self {
        Self::from_gaussian(&GaussianPyramid::build(base, depth, blur), blur)
    }

    /// Combines two pyramids level by level as `m * other + (1 - m) * self`.
    ///
    /// All three pyramids must come from bases of the same size and depth.
    pub fn blend_with(&self, other: &LaplacianPyramid, mask: &GaussianPyramid) -> Self {
        debug_assert_eq!(self.levels.len(), other.levels.len());
        debug_assert_eq!(self.levels.len(), mask.len());
        let levels = self
            .levels
            .iter()
            .zip(&other.levels)
            .zip(mask.levels())
            .map(|((first, second), m)| {
                let data = first
                    .data()
                    .iter()
                    .zip(second.data())
                    .zip(m.data())
                    .map(|((&l1, &l2), &w)| w * l2 + (1.0 - w) * l1)
                    .collect();
                Image::dense(data, first.width(), first.height())
            })
            .collect();
        Self {
            levels,
            blur: self.blur,
        }
    }

    /// Reconstructs the full-resolution image from coarsest to finest.
    pub fn collapse(&self) -> Image {
        let mut levels = self.levels.iter().rev();
        let mut acc = levels
            .next()
            .expect("pyramid holds its base level")
            .clone();
        for finer in levels {
            let up = expand(&acc, self.blur, finer.width(), finer.height());
            let data = up.data().iter().zip(finer.data()).map(|(e, l)| e + l).collect();
            acc = Image::dense(data, finer.width(), finer.height());
        }
        acc
    }

    /// Returns all levels; the last one is the coarse base.
    pub fn levels(&self) -> &[Image] {
        &self.levels
    }
}

#[cfg(test)]
mod tests {
    use super::{expand, reduce, GaussianPyramid, LaplacianPyramid};
    use crate::image::Image;

    #[test]
    fn reduce_halves_with_ceiling() {
        let img = Image::from_fn(7, 5, |x, y| (x * y) as f64).unwrap();
        let small = reduce(&img, 0.4);
        assert_eq!(small.shape(), (3, 4));
    }

    #[test]
    fn expand_of_constant_is_constant_in_the_interior() {
        let img = Image::from_vec(vec![1.0; 16], 4, 4).unwrap();
        let up = expand(&img, 0.375, 8, 8);
        for y in 2..6 {
            for x in 2..6 {
                assert!((up.at(x, y) - 1.0).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn gaussian_pyramid_has_depth_plus_one_levels() {
        let img = Image::from_fn(33, 17, |x, y| (x + y) as f64).unwrap();
        let pyr = GaussianPyramid::build(&img, 3, 0.4);
        let shapes: Vec<_> = pyr.levels().iter().map(Image::shape).collect();
        assert_eq!(shapes, vec![(17, 33), (9, 17), (5, 9), (3, 5)]);
    }

    #[test]
    fn collapse_inverts_odd_sized_pyramids() {
        let img = Image::from_fn(21, 13, |x, y| ((x * 7 + y * 3) % 11) as f64).unwrap();
        let lap = LaplacianPyramid::build(&img, 3, 0.4);
        let back = lap.collapse();
        for (a, b) in img.data().iter().zip(back.data()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_depth_pyramid_is_the_image_itself() {
        let img = Image::from_fn(4, 4, |x, _| x as f64).unwrap();
        let lap = LaplacianPyramid::build(&img, 0, 0.4);
        assert_eq!(lap.levels().len(), 1);
        assert_eq!(lap.collapse(), img);
    }
}
