use thiserror::Error;

/// Errors originating from the viewport and kernel layer.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid max iterations: {0} (must be >= 1)")]
    InvalidMaxIterations(u32),

    #[error("invalid viewport: {reason}")]
    InvalidViewport { reason: String },

    #[error("invalid canvas dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("invalid query parameter `{key}`: {value:?}")]
    InvalidQuery { key: String, value: String },

    #[error("degenerate selection: {width}×{height}")]
    DegenerateSelection { width: f64, height: f64 },
}
