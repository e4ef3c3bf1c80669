//! Multiresolution blending of the overlap with Laplacian pyramids.
//!
//! The overlap between the first tile and the second tile's footprint is cut
//! out of both, together with a step mask that hands the half of the overlap
//! nearer to the first tile over to it. The mask is smoothed, both cut-outs
//! are decomposed into Laplacian pyramids, blended level by level with the
//! mask's Gaussian pyramid and collapsed back into the canvas.
//!
//! Three overlap layouts are recognised from the rounded shift: the second
//! tile is offset diagonally from the first (an L-shaped overlap in the
//! intersection of both footprints), or mainly vertically, or mainly
//! horizontally. Either direction works on both axes; the mask always gives
//! the first tile the half of a band that faces it.

use crate::canvas::{arrange, Canvas, Frame, Layer, Shift};
use crate::image::filter::gaussian_filter;
use crate::image::pyramid::{GaussianPyramid, LaplacianPyramid};
use crate::image::Image;
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::MosaicResult;
use std::ops::Range;

/// Gaussian sigma applied to the step mask before its pyramid is built.
pub const MASK_SIGMA: f64 = 20.0;

/// Parameters of the pyramid blend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PyramidConfig {
    /// Generating kernel parameter `a` of the 5-tap reduce/expand filter.
    pub blur: f64,
    /// Shifts with both components below this many pixels are not blended,
    /// and only axes beyond it count as overlapping.
    pub margin: usize,
    /// Number of pyramid reductions.
    pub depth: usize,
}

impl Default for PyramidConfig {
    fn default() -> Self {
        Self {
            blur: 0.4,
            margin: 100,
            depth: 4,
        }
    }
}

/// Which edges of the second tile overlap the first tile, from the rounded
/// shift. A component counts when it exceeds the margin; a vertical shift
/// beyond the margin with the horizontal one exactly at it still blends
/// side by side.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    Corner,
    Stacked,
    SideBySide,
}

fn layout(rdy: isize, rdx: isize, margin: usize) -> Layout {
    let (ay, ax) = (rdy.unsigned_abs(), rdx.unsigned_abs());
    if ay > margin && ax > margin {
        Layout::Corner
    } else if ay > margin && ax < margin {
        Layout::Stacked
    } else {
        Layout::SideBySide
    }
}

/// Position of the second tile relative to the first, per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Side {
    below: bool,
    right: bool,
}

/// Rectangle in canvas coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Window {
    row: usize,
    col: usize,
    height: usize,
    width: usize,
}

impl Window {
    fn spanning(rows: Range<usize>, cols: Range<usize>) -> Self {
        Self {
            row: rows.start,
            col: cols.start,
            height: rows.len(),
            width: cols.len(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Overlap {
    /// L-shaped overlap inside `window`: `rows` rows along the edge facing
    /// the first tile vertically and `cols` columns along the edge facing it
    /// horizontally.
    Corner {
        window: Window,
        rows: usize,
        cols: usize,
    },
    /// Band across the full width of the window.
    Stacked { window: Window },
    /// Band across the full height of the window.
    SideBySide { window: Window },
}

impl Overlap {
    fn window(self) -> Window {
        match self {
            Overlap::Corner { window, .. }
            | Overlap::Stacked { window }
            | Overlap::SideBySide { window } => window,
        }
    }

    /// Row and column band thicknesses that split the mask.
    fn bands(self) -> (usize, usize) {
        match self {
            Overlap::Corner { rows, cols, .. } => (rows, cols),
            Overlap::Stacked { window } | Overlap::SideBySide { window } => (window.height, window.width),
        }
    }

    /// Whether window pixel `(x, y)` belongs to the overlap.
    fn covers(self, side: Side, x: usize, y: usize) -> bool {
        let window = self.window();
        let (rows, cols) = self.bands();
        near_first(y, window.height, rows, side.below) || near_first(x, window.width, cols, side.right)
    }
}

/// Whether `i` lies in the first `count` indices of `0..len` counted from the
/// end facing the first tile. `forward` means the first tile sits at index 0.
fn near_first(i: usize, len: usize, count: usize, forward: bool) -> bool {
    if forward {
        i < count
    } else {
        i + count >= len
    }
}

/// Composites `img2` onto `img1` at `shift`, blending the overlap across
/// `depth` pyramid levels.
///
/// Returns the plain arranged canvas when both shift components are below
/// `margin` or when the overlap is empty. The depth is clamped to what the
/// overlap window can be halved to.
pub fn pyramid_blend(img1: &Image, img2: &Image, shift: Shift, cfg: &PyramidConfig) -> MosaicResult<Image> {
    let Canvas { mut image, frame } = arrange(img1, img2, shift, Layer::First)?;
    let margin = cfg.margin as f64;
    if shift.dy.abs() < margin && shift.dx.abs() < margin {
        return Ok(image);
    }

    let _span = trace_span!("pyramid_blend", depth = cfg.depth, margin = cfg.margin).entered();
    let (rdy, rdx) = shift.rough();
    let side = Side {
        below: rdy >= 0,
        right: rdx >= 0,
    };
    let first = frame.place(img1, frame.first)?;

    let Some(overlap) = classify(&first, &frame, img1, img2, layout(rdy, rdx, cfg.margin), side, cfg.margin) else {
        trace_warn!("pyramid_empty_overlap", dy = rdy, dx = rdx);
        return Ok(image);
    };
    let window = overlap.window();
    let depth = cfg.depth.min(window.height.min(window.width).ilog2() as usize);
    trace_event!(
        "pyramid_overlap",
        height = window.height,
        width = window.width,
        depth = depth
    );

    let (y2, x2) = frame.second;
    let buffer1 = first
        .crop(window.col, window.row, window.width, window.height)?
        .filled(0.0);
    let buffer2 = img2
        .crop(window.col - x2, window.row - y2, window.width, window.height)?
        .filled(0.0);
    let cut_rows = rdy.unsigned_abs() > cfg.margin;
    let cut_cols = rdx.unsigned_abs() > cfg.margin;
    let mask = step_mask(overlap, side, cut_rows, cut_cols);

    let gauss_mask = GaussianPyramid::build(&gaussian_filter(&mask, MASK_SIGMA), depth, cfg.blur);
    let lapl1 = LaplacianPyramid::build(&buffer1, depth, cfg.blur);
    let lapl2 = LaplacianPyramid::build(&buffer2, depth, cfg.blur);
    let blended = lapl1.blend_with(&lapl2, &gauss_mask).collapse();

    for y in 0..window.height {
        for x in 0..window.width {
            let (gx, gy) = (window.col + x, window.row + y);
            // Pixels without data stay invalid.
            if overlap.covers(side, x, y) && image.is_valid(gx, gy) {
                image.set(gx, gy, blended.at(x, y));
            }
        }
    }
    Ok(image)
}

/// Measures the overlap window, or `None` when it is empty.
///
/// `first` is the first tile laid into the canvas on its own. The window is
/// always inside the intersection of both footprints.
fn classify(
    first: &Image,
    frame: &Frame,
    img1: &Image,
    img2: &Image,
    layout: Layout,
    side: Side,
    margin: usize,
) -> Option<Overlap> {
    let (y1, x1) = frame.first;
    let (y2, x2) = frame.second;
    let rows = y1.max(y2)..(y1 + img1.height()).min(y2 + img2.height());
    let cols = x1.max(x2)..(x1 + img1.width()).min(x2 + img2.width());
    if rows.is_empty() || cols.is_empty() {
        return None;
    }

    let overlap = match layout {
        Layout::Corner => {
            // Band thicknesses are read off the far column and row, where
            // only the bands themselves hold first-tile data.
            let far_col = if side.right { cols.end - 1 } else { cols.start };
            let far_row = if side.below { rows.end - 1 } else { rows.start };
            let band_rows = rows.clone().filter(|&y| first.is_valid(far_col, y)).count();
            let band_cols = cols.clone().filter(|&x| first.is_valid(x, far_row)).count();
            if band_rows == 0 && band_cols == 0 {
                return None;
            }
            Overlap::Corner {
                window: Window::spanning(rows, cols),
                rows: band_rows,
                cols: band_cols,
            }
        }
        Layout::Stacked => {
            let probe = x1 + margin.min(img1.width() - 1);
            let hits = (0..frame.height).filter(|&y| first.is_valid(probe, y));
            let rows = clip_to_hits(hits, rows)?;
            Overlap::Stacked {
                window: Window::spanning(rows, cols),
            }
        }
        Layout::SideBySide => {
            let probe = y1 + margin.min(img1.height() - 1);
            let hits = (0..frame.width).filter(|&x| first.is_valid(x, probe));
            let cols = clip_to_hits(hits, cols)?;
            Overlap::SideBySide {
                window: Window::spanning(rows, cols),
            }
        }
    };
    Some(overlap)
}

/// Clips `within` to the span from the first to the last of `hits`.
fn clip_to_hits(hits: impl Iterator<Item = usize>, within: Range<usize>) -> Option<Range<usize>> {
    let (lo, hi) = hits.fold(None, |span, i| match span {
        None => Some((i, i)),
        Some((lo, hi)) => Some((lo.min(i), hi.max(i))),
    })?;
    let clipped = within.start.max(lo)..within.end.min(hi + 1);
    (!clipped.is_empty()).then_some(clipped)
}

/// Weight of the second tile: zero on the half of each overlapping band
/// nearer to the first tile, one elsewhere.
fn step_mask(overlap: Overlap, side: Side, cut_rows: bool, cut_cols: bool) -> Image {
    let window = overlap.window();
    let (rows, cols) = overlap.bands();
    let rows_cut = if cut_rows { rows / 2 } else { 0 };
    let cols_cut = if cut_cols { cols / 2 } else { 0 };
    let (height, width) = (window.height, window.width);
    let data = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let to_first = near_first(y, height, rows_cut, side.below)
                    || near_first(x, width, cols_cut, side.right);
                if to_first {
                    0.0
                } else {
                    1.0
                }
            })
        })
        .collect();
    Image::dense(data, width, height)
}

#[cfg(test)]
mod tests {
    use super::{layout, step_mask, Layout, Overlap, Side, Window};

    const DOWN_RIGHT: Side = Side {
        below: true,
        right: true,
    };

    fn window(height: usize, width: usize) -> Window {
        Window {
            row: 0,
            col: 0,
            height,
            width,
        }
    }

    #[test]
    fn corner_mask_cuts_both_bands() {
        let overlap = Overlap::Corner {
            window: window(4, 6),
            rows: 2,
            cols: 4,
        };
        let mask = step_mask(overlap, DOWN_RIGHT, true, true);
        assert_eq!(mask.row(0).unwrap(), &[0.0; 6]);
        assert_eq!(mask.row(1).unwrap(), &[0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
        assert_eq!(mask.row(3).unwrap(), &[0.0, 0.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn stacked_mask_cuts_rows_only() {
        let overlap = Overlap::Stacked { window: window(4, 3) };
        let mask = step_mask(overlap, DOWN_RIGHT, true, false);
        assert_eq!(mask.row(1).unwrap(), &[0.0; 3]);
        assert_eq!(mask.row(2).unwrap(), &[1.0; 3]);
    }

    #[test]
    fn mask_faces_a_first_tile_below() {
        let overlap = Overlap::Corner {
            window: window(4, 4),
            rows: 4,
            cols: 2,
        };
        let side = Side {
            below: false,
            right: true,
        };
        let mask = step_mask(overlap, side, true, true);
        assert_eq!(mask.row(0).unwrap(), &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(mask.row(1).unwrap(), &[0.0, 1.0, 1.0, 1.0]);
        assert_eq!(mask.row(2).unwrap(), &[0.0; 4]);
        assert_eq!(mask.row(3).unwrap(), &[0.0; 4]);
    }

    #[test]
    fn corner_band_sits_on_the_first_tile_side() {
        let overlap = Overlap::Corner {
            window: window(5, 5),
            rows: 2,
            cols: 1,
        };
        let above = Side {
            below: false,
            right: true,
        };
        assert!(overlap.covers(above, 3, 4));
        assert!(!overlap.covers(above, 3, 1));
        assert!(overlap.covers(above, 0, 1));
        assert!(overlap.covers(DOWN_RIGHT, 3, 1));
    }

    #[test]
    fn shift_at_the_margin_blends_side_by_side() {
        assert_eq!(layout(30, 7, 8), Layout::Stacked);
        assert_eq!(layout(30, 8, 8), Layout::SideBySide);
        assert_eq!(layout(-30, 9, 8), Layout::Corner);
        assert_eq!(layout(3, -40, 8), Layout::SideBySide);
    }
}
