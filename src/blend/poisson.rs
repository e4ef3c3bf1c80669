//! Seamless cloning of the second tile by solving a discrete Poisson equation.
//!
//! The second tile's footprint in the arranged canvas is split into a one
//! pixel ring and an interior. Ring pixels whose outer neighbour already
//! holds data from the first tile take the first tile's value; the remaining
//! ring pixels take a heavily smoothed copy of the second tile. The interior
//! is then solved so that its discrete Laplacian matches the second tile's
//! while meeting the ring values:
//!
//! ```text
//! 4 u(p) - sum_{q in N(p), q interior} u(q) = sum_{q in N(p), q ring} f(q) + lap(g)(p)
//! ```
//!
//! with `g` the second tile and `lap(g)(p) = 4 g(p) - sum_{q in N(p)} g(q)`.

use crate::blend::Blended;
use crate::canvas::{arrange, Canvas, Layer, Shift};
use crate::image::filter::gaussian_filter;
use crate::image::Image;
use crate::solver::{bicg, SolverConfig, SparseMatrix, Triplet};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::MosaicResult;

/// Parameters of the Poisson blend.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PoissonConfig {
    /// Shifts with both components below this magnitude skip the solve.
    pub min_shift: f64,
    /// Gaussian sigma of the second tile copy used on unanchored ring pixels.
    pub fallback_sigma: f64,
    /// Stopping rules of the linear solve.
    pub solver: SolverConfig,
}

impl Default for PoissonConfig {
    fn default() -> Self {
        Self {
            min_shift: 10.0,
            fallback_sigma: 10.0,
            solver: SolverConfig::default(),
        }
    }
}

/// Composites `img2` onto `img1` at `shift` with a Poisson-blended seam.
///
/// Returns the plain arranged canvas (and no solver report) when the shift
/// is below [`PoissonConfig::min_shift`] on both axes or when the second
/// tile is too small to have an interior.
pub fn poisson_blend(img1: &Image, img2: &Image, shift: Shift, cfg: &PoissonConfig) -> MosaicResult<Blended> {
    let Canvas { mut image, frame } = arrange(img1, img2, shift, Layer::First)?;
    if shift.dy.abs() < cfg.min_shift && shift.dx.abs() < cfg.min_shift {
        return Ok(Blended::plain(image));
    }

    let (h, w) = img2.shape();
    if h < 3 || w < 3 {
        trace_warn!("poisson_skipped", width = w, height = h);
        return Ok(Blended::plain(image));
    }

    let _span = trace_span!("poisson_solve", width = w, height = h).entered();
    let (cy, cx) = frame.second;
    let first = frame.place(img1, frame.first)?;

    // Boundary values of the ring, indexed in tile coordinates.
    let smoothed = gaussian_filter(img2, cfg.fallback_sigma);
    let mut ring = vec![0.0f64; h * w];
    let mut anchored = 0usize;
    for (y, x) in ring_pixels(w, h) {
        let (gy, gx) = (cy + y, cx + x);
        let value = if has_outer_neighbour(&image, gx, gy, x, y, w, h) {
            anchored += 1;
            first.get(gx, gy).unwrap_or_else(|| image.at(gx, gy))
        } else {
            smoothed.at(x, y)
        };
        ring[y * w + x] = value;
        image.set(gx, gy, value);
    }
    trace_event!("poisson_ring", anchored = anchored, total = 2 * (w + h) - 4);

    let inner_w = w - 2;
    let n = inner_w * (h - 2);
    let index = |x: usize, y: usize| (y - 1) * inner_w + (x - 1);
    let is_interior = |x: usize, y: usize| x >= 1 && y >= 1 && x + 1 < w && y + 1 < h;

    let mut triplets = Vec::with_capacity(5 * n);
    let mut b = vec![0.0f64; n];
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let row = index(x, y);
            triplets.push(Triplet::new(row, row, 4.0));
            let mut rhs = 4.0 * img2.at(x, y);
            for (nx, ny) in [(x, y - 1), (x, y + 1), (x - 1, y), (x + 1, y)] {
                rhs -= img2.at(nx, ny);
                if is_interior(nx, ny) {
                    triplets.push(Triplet::new(row, index(nx, ny), -1.0));
                } else {
                    rhs += ring[ny * w + nx];
                }
            }
            b[row] = rhs;
        }
    }
    let a = SparseMatrix::from_triplets(n, n, &triplets)?;

    let (solution, report) = bicg(&a, &b, &cfg.solver);
    if !report.converged() {
        trace_warn!(
            "poisson_not_converged",
            iterations = report.iterations,
            residual = report.residual
        );
    }

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            image.set(cx + x, cy + y, solution[index(x, y)]);
        }
    }

    Ok(Blended {
        image,
        solver: Some(report),
    })
}

/// Ring coordinates `(y, x)` of a `w x h` rectangle, each visited once.
fn ring_pixels(w: usize, h: usize) -> impl Iterator<Item = (usize, usize)> {
    let top_bottom = (0..w).flat_map(move |x| [(0, x), (h - 1, x)]);
    let sides = (1..h - 1).flat_map(move |y| [(y, 0), (y, w - 1)]);
    top_bottom.chain(sides)
}

/// Whether the ring pixel `(x, y)` of the tile, at `(gx, gy)` on the canvas,
/// touches a valid canvas pixel outside the tile rectangle.
fn has_outer_neighbour(canvas: &Image, gx: usize, gy: usize, x: usize, y: usize, w: usize, h: usize) -> bool {
    (y == 0 && gy > 0 && canvas.is_valid(gx, gy - 1))
        || (y == h - 1 && canvas.is_valid(gx, gy + 1))
        || (x == 0 && gx > 0 && canvas.is_valid(gx - 1, gy))
        || (x == w - 1 && canvas.is_valid(gx + 1, gy))
}
