use crate::error::RenderError;
use crate::palette::ColorMapper;
use crate::raster::Raster;
use crate::tile::Tile;

/// Colorizes finished tiles into the frame raster.
///
/// Tiles of one frame cover disjoint row ranges, so they may be applied in
/// any order. Compositing happens on the control thread, one tile at a time;
/// the raster is never shared with the workers.
#[derive(Debug, Clone)]
pub struct ImageAssembler {
    raster: Raster,
    colors: ColorMapper,
}

impl ImageAssembler {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_colors(Raster::new(width, height), ColorMapper::new())
    }

    pub fn with_colors(raster: Raster, colors: ColorMapper) -> Self {
        Self { raster, colors }
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Swap in a new raster (a history snapshot or a zoom preview), returning
    /// the previous one.
    pub fn replace_raster(&mut self, raster: Raster) -> Raster {
        std::mem::replace(&mut self.raster, raster)
    }

    /// Write `counts` for `tile` into the raster.
    ///
    /// Count `i` lands at `(i % tile.width, tile.y_start + i / tile.width)`.
    /// Nothing is written if the counts or the tile geometry do not fit.
    pub fn apply_tile(
        &mut self,
        tile: &Tile,
        counts: &[u32],
        max_iterations: u32,
    ) -> crate::Result<()> {
        if counts.len() != tile.pixel_count() {
            return Err(RenderError::ResultLength {
                y_start: tile.y_start,
                expected: tile.pixel_count(),
                actual: counts.len(),
            });
        }
        if tile.width > self.raster.width
            || tile.y_start.saturating_add(tile.height) > self.raster.height
        {
            return Err(RenderError::TileOutOfBounds {
                y_start: tile.y_start,
                width: tile.width,
                height: tile.height,
                raster_width: self.raster.width,
                raster_height: self.raster.height,
            });
        }
        if tile.width == 0 {
            return Ok(());
        }

        for (row, row_counts) in counts.chunks_exact(tile.width as usize).enumerate() {
            let dst = self.raster.row_mut(tile.y_start + row as u32, tile.width);
            for (px, &n) in dst.chunks_exact_mut(4).zip(row_counts) {
                let [r, g, b] = self.colors.color_of(n, max_iterations);
                px.copy_from_slice(&[r, g, b, 255]);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use mandelband_core::Viewport;

    use super::*;
    use crate::palette::{INTERIOR, VIRIDIS};

    fn tile(y_start: u32, width: u32, height: u32) -> Tile {
        Tile {
            y_start,
            width,
            height,
            viewport: Viewport::default_for(width, height),
            generation: 1,
        }
    }

    #[test]
    fn writes_at_row_offset() {
        let mut asm = ImageAssembler::new(4, 6);
        let counts: Vec<u32> = (0..8).map(|i| if i == 5 { 10 } else { 1 }).collect();
        asm.apply_tile(&tile(2, 4, 2), &counts, 10).unwrap();

        // Count 5 of the tile is x = 1, y = 2 + 1.
        assert_eq!(asm.raster().rgb(1, 3), INTERIOR);
        assert_eq!(asm.raster().rgb(0, 2), VIRIDIS[0]);
        assert_eq!(asm.raster().rgb(3, 3), VIRIDIS[0]);
        // Rows outside the tile stay untouched (black).
        assert_eq!(asm.raster().pixel(0, 1), [0, 0, 0, 255]);
        assert_eq!(asm.raster().pixel(0, 4), [0, 0, 0, 255]);
    }

    #[test]
    fn arrival_order_does_not_matter() {
        let tiles = [tile(0, 8, 3), tile(3, 8, 3), tile(6, 8, 2)];
        let counts: Vec<Vec<u32>> = tiles
            .iter()
            .map(|t| (0..t.pixel_count() as u32).map(|i| i + t.y_start).collect())
            .collect();

        let mut forward = ImageAssembler::new(8, 8);
        for (t, c) in tiles.iter().zip(&counts) {
            forward.apply_tile(t, c, 100).unwrap();
        }
        let mut backward = ImageAssembler::new(8, 8);
        for (t, c) in tiles.iter().zip(&counts).rev() {
            backward.apply_tile(t, c, 100).unwrap();
        }
        assert_eq!(forward.raster(), backward.raster());
    }

    #[test]
    fn rejects_wrong_length() {
        let mut asm = ImageAssembler::new(4, 4);
        assert!(asm.apply_tile(&tile(0, 4, 2), &[1; 7], 10).is_err());
        assert_eq!(asm.raster(), &Raster::new(4, 4));
    }

    #[test]
    fn rejects_tile_past_bottom() {
        let mut asm = ImageAssembler::new(4, 4);
        assert!(asm.apply_tile(&tile(3, 4, 2), &[1; 8], 10).is_err());
        assert!(asm.apply_tile(&tile(0, 5, 1), &[1; 5], 10).is_err());
    }

    #[test]
    fn replace_raster_swaps() {
        let mut asm = ImageAssembler::new(2, 2);
        let mut other = Raster::new(2, 2);
        other.pixels[0] = 9;
        let old = asm.replace_raster(other.clone());
        assert_eq!(old, Raster::new(2, 2));
        assert_eq!(asm.raster(), &other);
    }
}
