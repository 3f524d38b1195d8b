pub mod error;
pub mod kernel;
pub mod selection;
pub mod viewport;

// Re-export primary types for convenience.
pub use error::CoreError;
pub use kernel::{EscapeTime, TileKernel};
pub use selection::{Canvas, DragPoint, SelectionRect};
pub use viewport::{PlaneRect, Viewport};

/// Convenience result type for the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
