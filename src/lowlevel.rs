//! Low-level building blocks behind the blenders.
//!
//! These expose the filters, pyramid steps and sparse solver used by the
//! Poisson and pyramid blends, for callers assembling their own strategies.
//! Most users should prefer [`crate::BlendStrategy`].

pub use crate::blend::{alpha_blend, max_blend, min_blend, poisson_blend, pyramid_blend};
pub use crate::image::filter::{gaussian_filter, generating_filter};
pub use crate::image::pyramid::{expand, reduce};
pub use crate::solver::{bicg, SparseMatrix, Triplet};
