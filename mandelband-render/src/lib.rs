pub mod assembler;
pub mod error;
pub mod export;
pub mod history;
pub mod messages;
pub mod palette;
pub mod raster;
pub mod renderer;
pub mod scheduler;
pub mod tile;
pub mod worker;

pub use assembler::ImageAssembler;
pub use error::RenderError;
pub use export::{export_png, ExportMetadata};
pub use history::{Direction, HistoryEntry, HistoryStack, MAX_HISTORY};
pub use messages::{DispatchMessage, ResultMessage, TileArgs, CALC_AREA};
pub use palette::{palette_index, ColorMapper, Rgb, CACHE_LIMIT, INTERIOR, VIRIDIS};
pub use raster::Raster;
pub use renderer::{render_frame, FrameStats};
pub use scheduler::{
    default_pool_size, CancelPolicy, CompletedFrame, FrameStatus, PollOutcome, SchedulerConfig,
    TileScheduler,
};
pub use tile::{build_tiles, RenderRequest, Tile, BAND_HEIGHT};
pub use worker::handle_dispatch;

/// Convenience result type for the render crate.
pub type Result<T> = std::result::Result<T, RenderError>;
