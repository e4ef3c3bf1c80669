//! Placement of two tiles into one shared frame.
//!
//! The first image sits at the origin and the second at the rounded shift.
//! The frame is the bounding box of both footprints; when the shift is
//! negative the origin moves so that every index stays non-negative. Pixels
//! outside both footprints are invalid.

use crate::image::Image;
use crate::util::{MosaicError, MosaicResult};

/// Translation `(dy, dx)` of the second tile relative to the first, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shift {
    /// Vertical offset (rows).
    pub dy: f64,
    /// Horizontal offset (columns).
    pub dx: f64,
}

impl Shift {
    /// Creates a shift from its row and column components.
    pub fn new(dy: f64, dx: f64) -> Self {
        Self { dy, dx }
    }

    /// Integer-rounded shift used for pixel placement.
    pub fn rough(self) -> (isize, isize) {
        rough_shift(self)
    }
}

/// Rounds a shift to whole pixels (half away from zero).
pub fn rough_shift(shift: Shift) -> (isize, isize) {
    (shift.dy.round() as isize, shift.dx.round() as isize)
}

/// Which source is laid down first; the other one is pasted on top.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Layer {
    /// The first image is the base layer (`order = 1`).
    #[default]
    First,
    /// The second image is the base layer (`order = 2`).
    Second,
}

/// Geometry of a two-tile frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: usize,
    /// Frame height in pixels.
    pub height: usize,
    /// Top-left `(y, x)` of the first image in frame coordinates.
    pub first: (usize, usize),
    /// Top-left `(y, x)` of the second image in frame coordinates.
    pub second: (usize, usize),
}

impl Frame {
    /// Computes the bounding box of `first` at the origin and `second` at `shift`.
    pub fn new(first: &Image, second: &Image, shift: Shift) -> MosaicResult<Self> {
        let (dy, dx) = shift.rough();
        let (h1, w1) = to_isize(first.shape())?;
        let (h2, w2) = to_isize(second.shape())?;

        let top = dy.min(0);
        let left = dx.min(0);
        let bottom = h1.max(dy + h2);
        let right = w1.max(dx + w2);

        let height = (bottom - top) as usize;
        let width = (right - left) as usize;
        Ok(Self {
            width,
            height,
            first: ((-top) as usize, (-left) as usize),
            second: ((dy - top) as usize, (dx - left) as usize),
        })
    }

    /// Pastes a single image into an otherwise empty frame at `at = (y, x)`.
    pub fn place(&self, image: &Image, at: (usize, usize)) -> MosaicResult<Image> {
        let mut canvas = Image::empty(self.width, self.height)?;
        canvas.paste_valid(image, at.1, at.0);
        Ok(canvas)
    }
}

/// Both tiles laid into their shared frame.
#[derive(Clone, Debug)]
pub struct Canvas {
    /// Composited pixels; invalid outside both footprints.
    pub image: Image,
    /// Frame geometry the pixels were laid into.
    pub frame: Frame,
}

/// Lays `img1` and `img2` into one frame, `img2` offset by `shift`.
///
/// The layer selected by `base` is pasted first and the other one on top of
/// it wherever the top image holds data.
pub fn arrange(img1: &Image, img2: &Image, shift: Shift, base: Layer) -> MosaicResult<Canvas> {
    let frame = Frame::new(img1, img2, shift)?;
    let mut image = Image::empty(frame.width, frame.height)?;
    match base {
        Layer::First => {
            image.paste_valid(img1, frame.first.1, frame.first.0);
            image.paste_valid(img2, frame.second.1, frame.second.0);
        }
        Layer::Second => {
            image.paste_valid(img2, frame.second.1, frame.second.0);
            image.paste_valid(img1, frame.first.1, frame.first.0);
        }
    }
    Ok(Canvas { image, frame })
}

fn to_isize((height, width): (usize, usize)) -> MosaicResult<(isize, isize)> {
    let h = isize::try_from(height).map_err(|_| MosaicError::InvalidDimensions { width, height })?;
    let w = isize::try_from(width).map_err(|_| MosaicError::InvalidDimensions { width, height })?;
    Ok((h, w))
}

#[cfg(test)]
mod tests {
    use super::{arrange, Frame, Layer, Shift};
    use crate::image::Image;

    #[test]
    fn frame_is_the_bounding_box() {
        let a = Image::from_vec(vec![1.0; 12], 4, 3).unwrap();
        let b = Image::from_vec(vec![2.0; 6], 3, 2).unwrap();
        let frame = Frame::new(&a, &b, Shift::new(2.0, 3.0)).unwrap();
        assert_eq!((frame.height, frame.width), (4, 6));
        assert_eq!(frame.first, (0, 0));
        assert_eq!(frame.second, (2, 3));
    }

    #[test]
    fn negative_shift_moves_the_origin() {
        let a = Image::from_vec(vec![1.0; 4], 2, 2).unwrap();
        let b = Image::from_vec(vec![2.0; 4], 2, 2).unwrap();
        let frame = Frame::new(&a, &b, Shift::new(-1.0, 0.4)).unwrap();
        assert_eq!((frame.height, frame.width), (3, 2));
        assert_eq!(frame.first, (1, 0));
        assert_eq!(frame.second, (0, 0));
    }

    #[test]
    fn base_layer_is_covered_by_the_other_image() {
        let a = Image::from_vec(vec![1.0; 4], 2, 2).unwrap();
        let b = Image::from_vec(vec![2.0; 4], 2, 2).unwrap();
        let shift = Shift::new(0.0, 1.0);
        let first = arrange(&a, &b, shift, Layer::First).unwrap().image;
        let second = arrange(&a, &b, shift, Layer::Second).unwrap().image;
        assert_eq!(first.row(0).unwrap(), &[1.0, 2.0, 2.0]);
        assert_eq!(second.row(0).unwrap(), &[1.0, 1.0, 2.0]);
        assert!(first.is_fully_valid());
    }

    #[test]
    fn uncovered_corners_stay_invalid() {
        let a = Image::from_vec(vec![1.0; 4], 2, 2).unwrap();
        let b = Image::from_vec(vec![2.0; 4], 2, 2).unwrap();
        let canvas = arrange(&a, &b, Shift::new(1.0, 1.0), Layer::First).unwrap();
        assert!(!canvas.image.is_valid(2, 0));
        assert!(!canvas.image.is_valid(0, 2));
        assert_eq!(canvas.image.get(1, 1), Some(2.0));
    }
}
