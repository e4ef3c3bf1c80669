//! tilemosaic registers overlapping image tiles with subpixel precision and
//! composites them into a seamless mosaic.
//!
//! Registration uses phase correlation with optional matrix-multiply DFT
//! upsampling. Blending offers per-pixel compositing (alpha, max, min),
//! Poisson seamless cloning and Laplacian pyramid blending, selected by name
//! through a small dispatcher. Row-parallel FFTs and filters are available
//! through the `rayon` feature.

pub mod blend;
pub mod canvas;
pub mod image;
pub mod lowlevel;
pub mod register;
pub mod solver;
mod trace;
pub mod util;

#[cfg(feature = "image-io")]
pub use crate::image::io;

pub use blend::{
    dispatch, validate, AlphaConfig, Blend, BlendMethod, BlendStrategy, Blended, PoissonConfig,
    PyramidConfig,
};
pub use canvas::{arrange, rough_shift, Canvas, Frame, Layer, Shift};
pub use crate::image::pyramid::{GaussianPyramid, LaplacianPyramid};
pub use crate::image::Image;
pub use register::{
    register, ForwardAxis, RegistrationConfig, RegistrationInput, RegistrationResult,
    SearchWindow, Spectrum,
};
pub use solver::{SolverConfig, SolverReport, SolverStatus};
pub use util::{MosaicError, MosaicResult};
