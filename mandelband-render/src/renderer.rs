use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use mandelband_core::TileKernel;

use crate::assembler::ImageAssembler;
use crate::tile::{build_tiles, RenderRequest};

/// Timing for a synchronous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    pub elapsed: Duration,
    pub tiles: usize,
}

/// Render a whole frame on the calling thread's Rayon pool.
///
/// Uses the same band layout and compositing as the
/// [`TileScheduler`](crate::TileScheduler) but has no generations: the call
/// returns once every band is in the raster. Used for one-shot exports and as
/// the reference the scheduler is checked against.
pub fn render_frame<K: TileKernel + ?Sized>(
    kernel: &K,
    request: &RenderRequest,
    band_height: u32,
    assembler: &mut ImageAssembler,
) -> crate::Result<FrameStats> {
    request.validate()?;
    let start = Instant::now();

    let tiles = build_tiles(request, band_height, 0)?;
    debug!(
        tiles = tiles.len(),
        width = request.width,
        height = request.height,
        "Starting synchronous render"
    );

    let counts: Vec<Vec<u32>> = tiles
        .par_iter()
        .map(|tile| {
            kernel.compute_tile(
                tile.width,
                tile.height,
                tile.viewport.offset_x,
                tile.origin_y(),
                tile.viewport.scale,
                request.max_iterations,
            )
        })
        .collect();

    for (tile, data) in tiles.iter().zip(&counts) {
        assembler.apply_tile(tile, data, request.max_iterations)?;
    }

    let elapsed = start.elapsed();
    info!(
        elapsed_ms = elapsed.as_millis(),
        tiles = tiles.len(),
        "Render complete"
    );
    Ok(FrameStats {
        elapsed,
        tiles: tiles.len(),
    })
}
