use mandelband_core::{CoreError, Viewport};

use crate::error::RenderError;

/// Default band height in rows.
pub const BAND_HEIGHT: u32 = 100;

/// Everything needed to render one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub viewport: Viewport,
    /// Canvas width in pixels.
    pub width: u32,
    /// Canvas height in pixels.
    pub height: u32,
    pub max_iterations: u32,
}

impl RenderRequest {
    pub fn new(viewport: Viewport, width: u32, height: u32, max_iterations: u32) -> Self {
        Self {
            viewport,
            width,
            height,
            max_iterations,
        }
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.width == 0 || self.height == 0 {
            return Err(RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        if self.max_iterations < 1 {
            return Err(CoreError::InvalidMaxIterations(self.max_iterations).into());
        }
        Ok(())
    }
}

/// A full-width horizontal band of the canvas, the unit of compute work.
///
/// Tiles are immutable once dispatched. Each carries the viewport it was cut
/// from and the generation of the render that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    /// First canvas row covered by this tile.
    pub y_start: u32,
    pub width: u32,
    /// Rows in this tile (the last band of a frame may be shorter).
    pub height: u32,
    pub viewport: Viewport,
    pub generation: u64,
}

impl Tile {
    /// Number of pixels in this tile.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Canvas rows covered, as a half-open range.
    pub fn rows(&self) -> std::ops::Range<u32> {
        self.y_start..self.y_start + self.height
    }

    /// Plane y-coordinate of this tile's first row.
    pub fn origin_y(&self) -> f64 {
        self.viewport.band_origin_y(self.y_start)
    }
}

/// Cut the canvas of `request` into bands of `band_height` rows.
///
/// The bands cover `[0, height)` exactly once; the final band is clipped when
/// `band_height` does not divide the height.
pub fn build_tiles(
    request: &RenderRequest,
    band_height: u32,
    generation: u64,
) -> crate::Result<Vec<Tile>> {
    if band_height == 0 {
        return Err(RenderError::InvalidBandHeight(band_height));
    }
    let mut tiles = Vec::with_capacity(request.height.div_ceil(band_height) as usize);
    let mut y = 0;
    while y < request.height {
        let rows = band_height.min(request.height - y);
        tiles.push(Tile {
            y_start: y,
            width: request.width,
            height: rows,
            viewport: request.viewport,
            generation,
        });
        y += rows;
    }
    Ok(tiles)
}
