//! Error types for aspect evaluation

use thiserror::Error;

/// Errors raised while classifying or evaluating an elevation raster
#[derive(Error, Debug)]
pub enum AspectError {
    /// The storage kind cannot be served by any evaluator in this build
    #[error("Unsupported array type: {0}")]
    UnsupportedStorage(String),

    /// Known storage combination without an implementation
    #[error("Backend not implemented: {0}")]
    Unimplemented(&'static str),

    /// A GPU was required but none could be initialized
    #[error("GPU device unavailable: {0}")]
    DeviceUnavailable(String),

    /// The device failed while running or reading back the kernel
    #[error("GPU device error: {0}")]
    Device(String),

    #[error("Grid buffer of length {len} does not match shape ({rows}, {cols})")]
    ShapeMismatch { rows: usize, cols: usize, len: usize },

    #[error("Cannot reflect-pad an empty tile of shape ({rows}, {cols})")]
    EmptyTile { rows: usize, cols: usize },

    #[error("Invalid chunk extent ({rows}, {cols}): both must be non-zero")]
    InvalidChunking { rows: usize, cols: usize },
}

/// Result alias for aspect operations
pub type Result<T> = std::result::Result<T, AspectError>;
