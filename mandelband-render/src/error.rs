use thiserror::Error;

/// Errors originating from the rendering pipeline.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid band height: {0} (must be > 0)")]
    InvalidBandHeight(u32),

    #[error("invalid image dimensions: {width}×{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("unknown dispatch method: {0:?}")]
    UnknownMethod(String),

    #[error("tile at row {y_start} carries {actual} counts, expected {expected}")]
    ResultLength {
        y_start: u32,
        expected: usize,
        actual: usize,
    },

    #[error("tile {width}×{height} at row {y_start} does not fit a {raster_width}×{raster_height} raster")]
    TileOutOfBounds {
        y_start: u32,
        width: u32,
        height: u32,
        raster_width: u32,
        raster_height: u32,
    },

    #[error("compute kernel panicked: {0}")]
    KernelPanic(String),

    #[error("failed to spawn compute worker {index}: {source}")]
    WorkerSpawn {
        index: usize,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode PNG: {0}")]
    Encode(#[from] png::EncodingError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Core(#[from] mandelband_core::CoreError),
}
