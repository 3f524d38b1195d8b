use rayon::prelude::*;

use crate::palette::Rgb;

/// An RGBA pixel buffer, the compositing target for finished tiles.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    /// RGBA pixel data, 4 bytes per pixel, row-major order.
    pub pixels: Vec<u8>,
}

impl Raster {
    /// Create a new buffer filled with black (opaque).
    pub fn new(width: u32, height: u32) -> Self {
        let mut pixels = vec![0u8; width as usize * height as usize * 4];
        for chunk in pixels.chunks_exact_mut(4) {
            chunk[3] = 255;
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    /// RGBA value at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = (y as usize * self.width as usize + x as usize) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Color of `(x, y)` without alpha.
    pub fn rgb(&self, x: u32, y: u32) -> Rgb {
        let [r, g, b, _] = self.pixel(x, y);
        [r, g, b]
    }

    /// Mutable RGBA bytes for `width` pixels of row `y`, starting at column 0.
    pub(crate) fn row_mut(&mut self, y: u32, width: u32) -> &mut [u8] {
        let start = y as usize * self.width as usize * 4;
        &mut self.pixels[start..start + width as usize * 4]
    }

    /// Stretch the source region `(x, y, width, height)` of this raster over
    /// a new raster of the same size, nearest-neighbour.
    ///
    /// This is the cheap preview shown after a zoom selection while the real
    /// render is in flight. Samples falling outside this raster are black.
    pub fn resample(&self, x: f64, y: f64, width: f64, height: f64) -> Raster {
        let mut out = Raster::new(self.width, self.height);
        if self.width == 0 || self.height == 0 {
            return out;
        }
        let sx = width / self.width as f64;
        let sy = height / self.height as f64;
        let stride = self.width as usize * 4;

        out.pixels
            .par_chunks_mut(stride)
            .enumerate()
            .for_each(|(dy, row)| {
                let src_y = (y + (dy as f64 + 0.5) * sy).floor();
                if src_y < 0.0 || src_y >= self.height as f64 {
                    return;
                }
                let src_row = src_y as usize * stride;
                for (dx, px) in row.chunks_exact_mut(4).enumerate() {
                    let src_x = (x + (dx as f64 + 0.5) * sx).floor();
                    if src_x < 0.0 || src_x >= self.width as f64 {
                        continue;
                    }
                    let i = src_row + src_x as usize * 4;
                    px.copy_from_slice(&self.pixels[i..i + 4]);
                }
            });
        out
    }
}
