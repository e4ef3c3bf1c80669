//! Error types for tilemosaic.

use thiserror::Error;

/// Result alias for tilemosaic operations.
pub type MosaicResult<T> = std::result::Result<T, MosaicError>;

/// Errors that can occur when registering or blending tiles.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum MosaicError {
    /// The two inputs of a registration do not have the same shape.
    #[error("shape mismatch: source is {src_height}x{src_width}, target is {target_height}x{target_width}")]
    ShapeMismatch {
        src_width: usize,
        src_height: usize,
        target_width: usize,
        target_height: usize,
    },
    /// Subpixel refinement was requested on data that is not two-dimensional.
    #[error("subpixel refinement requires 2D data, got {width}x{height}")]
    UnsupportedDimension { width: usize, height: usize },
    /// The blend method name is not one of the known strategies.
    #[error("unknown blend method {name:?}, expected one of alpha, max, min, poisson, pyramid")]
    UnknownMethod { name: String },
    /// The option key is not accepted by the selected blend method.
    #[error("option {key:?} is not allowed for method {method}, allowed: {allowed:?}")]
    InvalidOption {
        method: &'static str,
        key: String,
        allowed: &'static [&'static str],
    },
    /// The option value is outside the accepted range.
    #[error("invalid value {value} for option {key:?}: {reason}")]
    InvalidOptionValue {
        key: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// The input data or parameters are invalid.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// Image dimensions are zero or overflow.
    #[error("invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: usize, height: usize },
    /// A backing buffer is smaller than the image it should hold.
    #[error("buffer too small: needed {needed}, got {got}")]
    BufferTooSmall { needed: usize, got: usize },
    /// A region of interest does not fit inside the image.
    #[error("roi out of bounds: x={x}, y={y}, width={width}, height={height}, image={img_width}x{img_height}")]
    RoiOutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        img_width: usize,
        img_height: usize,
    },
    /// The image carries no usable signal.
    #[error("degenerate image: {reason}")]
    DegenerateImage { reason: &'static str },
    /// Loading or saving an image file failed.
    #[error("image io: {reason}")]
    ImageIo { reason: String },
}
