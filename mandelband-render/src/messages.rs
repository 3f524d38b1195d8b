//! Messages exchanged between the scheduler and its compute workers.
//!
//! The shapes mirror the JSON a browser worker would receive, so they derive
//! serde with camelCase field names.

use serde::{Deserialize, Serialize};

use mandelband_core::Viewport;

use crate::error::RenderError;
use crate::tile::Tile;

/// The only method compute workers understand.
pub const CALC_AREA: &str = "calc_area";

/// Geometry and limits for one band.
///
/// `offset_x`, `offset_y` and `scale` are the frame's viewport, not the
/// band's: workers derive the band origin from `y_start` themselves.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileArgs {
    pub y_start: u32,
    pub width: u32,
    pub height: u32,
    pub offset_x: f64,
    pub offset_y: f64,
    pub scale: f64,
    pub i_max: u32,
}

/// Control → worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchMessage {
    pub method: String,
    pub render_generation: u64,
    pub args: TileArgs,
}

/// Worker → control: the dispatch echoed back with its iteration counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMessage {
    #[serde(flatten)]
    pub dispatch: DispatchMessage,
    pub result: Vec<u32>,
}

impl DispatchMessage {
    pub fn calc_area(tile: &Tile, max_iterations: u32) -> Self {
        Self {
            method: CALC_AREA.to_string(),
            render_generation: tile.generation,
            args: TileArgs {
                y_start: tile.y_start,
                width: tile.width,
                height: tile.height,
                offset_x: tile.viewport.offset_x,
                offset_y: tile.viewport.offset_y,
                scale: tile.viewport.scale,
                i_max: max_iterations,
            },
        }
    }

    /// The tile this message describes.
    pub fn tile(&self) -> Tile {
        Tile {
            y_start: self.args.y_start,
            width: self.args.width,
            height: self.args.height,
            viewport: Viewport {
                offset_x: self.args.offset_x,
                offset_y: self.args.offset_y,
                scale: self.args.scale,
            },
            generation: self.render_generation,
        }
    }
}

impl ResultMessage {
    pub fn generation(&self) -> u64 {
        self.dispatch.render_generation
    }
}

/// What the control thread hears from the pool.
#[derive(Debug)]
pub(crate) enum WorkerEvent {
    Completed(ResultMessage),
    /// The worker hit a fatal error and has exited.
    Failed {
        worker: usize,
        generation: u64,
        error: RenderError,
    },
}
