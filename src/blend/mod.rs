//! Blending strategies and the name-based dispatcher.
//!
//! Every strategy implements [`Blend`]. Named strategies are selected with
//! [`validate`] (name plus numeric options) or [`dispatch`] (name only);
//! callers can also plug in their own closure with [`BlendStrategy::custom`].
//!
//! The dispatcher fills missing options with its own defaults (`alpha = 1`,
//! `blur = 0.4`, `margin = 50`, `depth = 4`). These differ from the
//! `Default` impls of [`AlphaConfig`] (`alpha = 0.4`) and [`PyramidConfig`]
//! (`margin = 100`), which apply when a strategy is configured directly.

pub mod poisson;
pub mod pyramid;
pub mod simple;

pub use poisson::{poisson_blend, PoissonConfig};
pub use pyramid::{pyramid_blend, PyramidConfig, MASK_SIGMA};
pub use simple::{alpha_blend, max_blend, min_blend, AlphaConfig};

use crate::canvas::Shift;
use crate::image::Image;
use crate::solver::SolverReport;
use crate::trace::trace_span;
use crate::util::{MosaicError, MosaicResult};
use std::fmt;
use std::str::FromStr;

/// Dispatcher default for `alpha`.
pub const DEFAULT_ALPHA: f64 = 1.0;
/// Dispatcher default for `blur`.
pub const DEFAULT_BLUR: f64 = 0.4;
/// Dispatcher default for `margin`.
pub const DEFAULT_MARGIN: usize = 50;
/// Dispatcher default for `depth`.
pub const DEFAULT_DEPTH: usize = 4;
/// Largest `depth` accepted by [`validate`].
pub const MAX_DEPTH: usize = 16;

/// Output of a blend.
#[derive(Clone, Debug, PartialEq)]
pub struct Blended {
    /// Composited canvas.
    pub image: Image,
    /// Report of the linear solve, for strategies that run one.
    pub solver: Option<SolverReport>,
}

impl Blended {
    pub(crate) fn plain(image: Image) -> Self {
        Self { image, solver: None }
    }
}

/// A way of compositing a second tile onto a first one.
pub trait Blend {
    /// Composites `img2`, offset by `shift`, onto `img1`.
    fn blend(&self, img1: &Image, img2: &Image, shift: Shift) -> MosaicResult<Blended>;
}

impl<F> Blend for F
where
    F: Fn(&Image, &Image, Shift) -> MosaicResult<Image>,
{
    fn blend(&self, img1: &Image, img2: &Image, shift: Shift) -> MosaicResult<Blended> {
        self(img1, img2, shift).map(Blended::plain)
    }
}

/// Names of the built-in strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BlendMethod {
    /// Weighted average of the two layer orders.
    Alpha,
    /// Pixelwise maximum.
    Max,
    /// Pixelwise minimum.
    Min,
    /// Poisson seamless cloning.
    Poisson,
    /// Laplacian pyramid blending.
    Pyramid,
}

impl BlendMethod {
    /// All built-in methods.
    pub const ALL: [BlendMethod; 5] = [
        BlendMethod::Alpha,
        BlendMethod::Max,
        BlendMethod::Min,
        BlendMethod::Poisson,
        BlendMethod::Pyramid,
    ];

    /// Lower-case method name.
    pub fn name(self) -> &'static str {
        match self {
            BlendMethod::Alpha => "alpha",
            BlendMethod::Max => "max",
            BlendMethod::Min => "min",
            BlendMethod::Poisson => "poisson",
            BlendMethod::Pyramid => "pyramid",
        }
    }

    /// Option keys accepted by the method.
    pub fn allowed_options(self) -> &'static [&'static str] {
        match self {
            BlendMethod::Alpha => &["alpha"],
            BlendMethod::Max | BlendMethod::Min | BlendMethod::Poisson => &[],
            BlendMethod::Pyramid => &["blur", "margin", "depth"],
        }
    }
}

impl FromStr for BlendMethod {
    type Err = MosaicError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlendMethod::ALL
            .into_iter()
            .find(|method| method.name() == s)
            .ok_or_else(|| MosaicError::UnknownMethod { name: s.to_string() })
    }
}

impl fmt::Display for BlendMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A configured blending strategy.
pub enum BlendStrategy {
    /// See [`alpha_blend`].
    Alpha(AlphaConfig),
    /// See [`max_blend`].
    Max,
    /// See [`min_blend`].
    Min,
    /// See [`poisson_blend`].
    Poisson(PoissonConfig),
    /// See [`pyramid_blend`].
    Pyramid(PyramidConfig),
    /// Caller-supplied strategy.
    Custom(Box<dyn Blend + Send + Sync>),
}

impl BlendStrategy {
    /// Wraps a closure `(img1, img2, shift) -> canvas` as a strategy.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Image, &Image, Shift) -> MosaicResult<Image> + Send + Sync + 'static,
    {
        BlendStrategy::Custom(Box::new(f))
    }

    /// Built-in method behind the strategy, or `None` for custom ones.
    pub fn method(&self) -> Option<BlendMethod> {
        match self {
            BlendStrategy::Alpha(_) => Some(BlendMethod::Alpha),
            BlendStrategy::Max => Some(BlendMethod::Max),
            BlendStrategy::Min => Some(BlendMethod::Min),
            BlendStrategy::Poisson(_) => Some(BlendMethod::Poisson),
            BlendStrategy::Pyramid(_) => Some(BlendMethod::Pyramid),
            BlendStrategy::Custom(_) => None,
        }
    }
}

impl Default for BlendStrategy {
    fn default() -> Self {
        BlendStrategy::Pyramid(PyramidConfig {
            blur: DEFAULT_BLUR,
            margin: DEFAULT_MARGIN,
            depth: DEFAULT_DEPTH,
        })
    }
}

impl fmt::Debug for BlendStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlendStrategy::Alpha(cfg) => f.debug_tuple("Alpha").field(cfg).finish(),
            BlendStrategy::Max => f.write_str("Max"),
            BlendStrategy::Min => f.write_str("Min"),
            BlendStrategy::Poisson(cfg) => f.debug_tuple("Poisson").field(cfg).finish(),
            BlendStrategy::Pyramid(cfg) => f.debug_tuple("Pyramid").field(cfg).finish(),
            BlendStrategy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl Blend for BlendStrategy {
    fn blend(&self, img1: &Image, img2: &Image, shift: Shift) -> MosaicResult<Blended> {
        let _span = trace_span!(
            "blend",
            method = self.method().map_or("custom", BlendMethod::name),
            dy = shift.dy,
            dx = shift.dx
        )
        .entered();
        match self {
            BlendStrategy::Alpha(cfg) => alpha_blend(img1, img2, shift, cfg).map(Blended::plain),
            BlendStrategy::Max => max_blend(img1, img2, shift).map(Blended::plain),
            BlendStrategy::Min => min_blend(img1, img2, shift).map(Blended::plain),
            BlendStrategy::Poisson(cfg) => poisson_blend(img1, img2, shift, cfg),
            BlendStrategy::Pyramid(cfg) => pyramid_blend(img1, img2, shift, cfg).map(Blended::plain),
            BlendStrategy::Custom(inner) => inner.blend(img1, img2, shift),
        }
    }
}

/// Builds the strategy for `method` with dispatcher defaults.
pub fn dispatch(method: &str) -> MosaicResult<BlendStrategy> {
    validate(method, std::iter::empty::<(&str, f64)>())
}

/// Checks `options` against `method` and builds the strategy.
///
/// Keys outside the method's allowed set fail with
/// [`MosaicError::InvalidOption`]; out-of-range values fail with
/// [`MosaicError::InvalidOptionValue`]. Missing keys take the dispatcher
/// defaults.
pub fn validate<I, K>(method: &str, options: I) -> MosaicResult<BlendStrategy>
where
    I: IntoIterator<Item = (K, f64)>,
    K: AsRef<str>,
{
    let method: BlendMethod = method.parse()?;
    let allowed = method.allowed_options();

    let mut alpha = DEFAULT_ALPHA;
    let mut blur = DEFAULT_BLUR;
    let mut margin = DEFAULT_MARGIN;
    let mut depth = DEFAULT_DEPTH;
    for (key, value) in options {
        let key = key.as_ref();
        if !allowed.contains(&key) {
            return Err(MosaicError::InvalidOption {
                method: method.name(),
                key: key.to_string(),
                allowed,
            });
        }
        match key {
            "alpha" => alpha = unit_interval("alpha", value)?,
            "blur" => blur = finite("blur", value)?,
            "margin" => margin = count("margin", value)?,
            "depth" => depth = depth_option(value)?,
            _ => {}
        }
    }

    Ok(match method {
        BlendMethod::Alpha => BlendStrategy::Alpha(AlphaConfig { alpha }),
        BlendMethod::Max => BlendStrategy::Max,
        BlendMethod::Min => BlendStrategy::Min,
        BlendMethod::Poisson => BlendStrategy::Poisson(PoissonConfig::default()),
        BlendMethod::Pyramid => BlendStrategy::Pyramid(PyramidConfig { blur, margin, depth }),
    })
}

fn unit_interval(key: &'static str, value: f64) -> MosaicResult<f64> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(MosaicError::InvalidOptionValue {
            key,
            value,
            reason: "must lie in [0, 1]",
        })
    }
}

fn finite(key: &'static str, value: f64) -> MosaicResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(MosaicError::InvalidOptionValue {
            key,
            value,
            reason: "must be finite",
        })
    }
}

fn depth_option(value: f64) -> MosaicResult<usize> {
    let depth = count("depth", value)?;
    if depth > MAX_DEPTH {
        return Err(MosaicError::InvalidOptionValue {
            key: "depth",
            value,
            reason: "must not exceed 16",
        });
    }
    Ok(depth)
}

fn count(key: &'static str, value: f64) -> MosaicResult<usize> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value <= u32::MAX as f64 {
        Ok(value as usize)
    } else {
        Err(MosaicError::InvalidOptionValue {
            key,
            value,
            reason: "must be a non-negative integer",
        })
    }
}
