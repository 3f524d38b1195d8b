const LUT_SIZE: usize = 256;

/// An RGB triple.
pub type Rgb = [u8; 3];

/// Color of points that never escaped.
pub const INTERIOR: Rgb = [0, 0, 0];

// ---------------------------------------------------------------------------
// Palette data
// ---------------------------------------------------------------------------

/// The viridis ramp, dark purple through teal to yellow.
pub static VIRIDIS: [Rgb; LUT_SIZE] = [
    [0x44, 0x01, 0x54], [0x44, 0x02, 0x56], [0x45, 0x04, 0x57], [0x45, 0x05, 0x59],
    [0x46, 0x07, 0x5a], [0x46, 0x08, 0x5c], [0x46, 0x0a, 0x5d], [0x46, 0x0b, 0x5e],
    [0x47, 0x0d, 0x60], [0x47, 0x0e, 0x61], [0x47, 0x10, 0x63], [0x47, 0x11, 0x64],
    [0x47, 0x13, 0x65], [0x48, 0x14, 0x67], [0x48, 0x16, 0x68], [0x48, 0x17, 0x69],
    [0x48, 0x18, 0x6a], [0x48, 0x1a, 0x6c], [0x48, 0x1b, 0x6d], [0x48, 0x1c, 0x6e],
    [0x48, 0x1d, 0x6f], [0x48, 0x1f, 0x70], [0x48, 0x20, 0x71], [0x48, 0x21, 0x73],
    [0x48, 0x23, 0x74], [0x48, 0x24, 0x75], [0x48, 0x25, 0x76], [0x48, 0x26, 0x77],
    [0x48, 0x28, 0x78], [0x48, 0x29, 0x79], [0x47, 0x2a, 0x7a], [0x47, 0x2c, 0x7a],
    [0x47, 0x2d, 0x7b], [0x47, 0x2e, 0x7c], [0x47, 0x2f, 0x7d], [0x46, 0x30, 0x7e],
    [0x46, 0x32, 0x7e], [0x46, 0x33, 0x7f], [0x46, 0x34, 0x80], [0x45, 0x35, 0x81],
    [0x45, 0x37, 0x81], [0x45, 0x38, 0x82], [0x44, 0x39, 0x83], [0x44, 0x3a, 0x83],
    [0x44, 0x3b, 0x84], [0x43, 0x3d, 0x84], [0x43, 0x3e, 0x85], [0x42, 0x3f, 0x85],
    [0x42, 0x40, 0x86], [0x42, 0x41, 0x86], [0x41, 0x42, 0x87], [0x41, 0x44, 0x87],
    [0x40, 0x45, 0x88], [0x40, 0x46, 0x88], [0x3f, 0x47, 0x88], [0x3f, 0x48, 0x89],
    [0x3e, 0x49, 0x89], [0x3e, 0x4a, 0x89], [0x3e, 0x4c, 0x8a], [0x3d, 0x4d, 0x8a],
    [0x3d, 0x4e, 0x8a], [0x3c, 0x4f, 0x8a], [0x3c, 0x50, 0x8b], [0x3b, 0x51, 0x8b],
    [0x3b, 0x52, 0x8b], [0x3a, 0x53, 0x8b], [0x3a, 0x54, 0x8c], [0x39, 0x55, 0x8c],
    [0x39, 0x56, 0x8c], [0x38, 0x58, 0x8c], [0x38, 0x59, 0x8c], [0x37, 0x5a, 0x8c],
    [0x37, 0x5b, 0x8d], [0x36, 0x5c, 0x8d], [0x36, 0x5d, 0x8d], [0x35, 0x5e, 0x8d],
    [0x35, 0x5f, 0x8d], [0x34, 0x60, 0x8d], [0x34, 0x61, 0x8d], [0x33, 0x62, 0x8d],
    [0x33, 0x63, 0x8d], [0x32, 0x64, 0x8e], [0x32, 0x65, 0x8e], [0x31, 0x66, 0x8e],
    [0x31, 0x67, 0x8e], [0x31, 0x68, 0x8e], [0x30, 0x69, 0x8e], [0x30, 0x6a, 0x8e],
    [0x2f, 0x6b, 0x8e], [0x2f, 0x6c, 0x8e], [0x2e, 0x6d, 0x8e], [0x2e, 0x6e, 0x8e],
    [0x2e, 0x6f, 0x8e], [0x2d, 0x70, 0x8e], [0x2d, 0x71, 0x8e], [0x2c, 0x71, 0x8e],
    [0x2c, 0x72, 0x8e], [0x2c, 0x73, 0x8e], [0x2b, 0x74, 0x8e], [0x2b, 0x75, 0x8e],
    [0x2a, 0x76, 0x8e], [0x2a, 0x77, 0x8e], [0x2a, 0x78, 0x8e], [0x29, 0x79, 0x8e],
    [0x29, 0x7a, 0x8e], [0x29, 0x7b, 0x8e], [0x28, 0x7c, 0x8e], [0x28, 0x7d, 0x8e],
    [0x27, 0x7e, 0x8e], [0x27, 0x7f, 0x8e], [0x27, 0x80, 0x8e], [0x26, 0x81, 0x8e],
    [0x26, 0x82, 0x8e], [0x26, 0x82, 0x8e], [0x25, 0x83, 0x8e], [0x25, 0x84, 0x8e],
    [0x25, 0x85, 0x8e], [0x24, 0x86, 0x8e], [0x24, 0x87, 0x8e], [0x23, 0x88, 0x8e],
    [0x23, 0x89, 0x8e], [0x23, 0x8a, 0x8d], [0x22, 0x8b, 0x8d], [0x22, 0x8c, 0x8d],
    [0x22, 0x8d, 0x8d], [0x21, 0x8e, 0x8d], [0x21, 0x8f, 0x8d], [0x21, 0x90, 0x8d],
    [0x21, 0x91, 0x8c], [0x20, 0x92, 0x8c], [0x20, 0x92, 0x8c], [0x20, 0x93, 0x8c],
    [0x1f, 0x94, 0x8c], [0x1f, 0x95, 0x8b], [0x1f, 0x96, 0x8b], [0x1f, 0x97, 0x8b],
    [0x1f, 0x98, 0x8b], [0x1f, 0x99, 0x8a], [0x1f, 0x9a, 0x8a], [0x1e, 0x9b, 0x8a],
    [0x1e, 0x9c, 0x89], [0x1e, 0x9d, 0x89], [0x1f, 0x9e, 0x89], [0x1f, 0x9f, 0x88],
    [0x1f, 0xa0, 0x88], [0x1f, 0xa1, 0x88], [0x1f, 0xa1, 0x87], [0x1f, 0xa2, 0x87],
    [0x20, 0xa3, 0x86], [0x20, 0xa4, 0x86], [0x21, 0xa5, 0x85], [0x21, 0xa6, 0x85],
    [0x22, 0xa7, 0x85], [0x22, 0xa8, 0x84], [0x23, 0xa9, 0x83], [0x24, 0xaa, 0x83],
    [0x25, 0xab, 0x82], [0x25, 0xac, 0x82], [0x26, 0xad, 0x81], [0x27, 0xad, 0x81],
    [0x28, 0xae, 0x80], [0x29, 0xaf, 0x7f], [0x2a, 0xb0, 0x7f], [0x2c, 0xb1, 0x7e],
    [0x2d, 0xb2, 0x7d], [0x2e, 0xb3, 0x7c], [0x2f, 0xb4, 0x7c], [0x31, 0xb5, 0x7b],
    [0x32, 0xb6, 0x7a], [0x34, 0xb6, 0x79], [0x35, 0xb7, 0x79], [0x37, 0xb8, 0x78],
    [0x38, 0xb9, 0x77], [0x3a, 0xba, 0x76], [0x3b, 0xbb, 0x75], [0x3d, 0xbc, 0x74],
    [0x3f, 0xbc, 0x73], [0x40, 0xbd, 0x72], [0x42, 0xbe, 0x71], [0x44, 0xbf, 0x70],
    [0x46, 0xc0, 0x6f], [0x48, 0xc1, 0x6e], [0x4a, 0xc1, 0x6d], [0x4c, 0xc2, 0x6c],
    [0x4e, 0xc3, 0x6b], [0x50, 0xc4, 0x6a], [0x52, 0xc5, 0x69], [0x54, 0xc5, 0x68],
    [0x56, 0xc6, 0x67], [0x58, 0xc7, 0x65], [0x5a, 0xc8, 0x64], [0x5c, 0xc8, 0x63],
    [0x5e, 0xc9, 0x62], [0x60, 0xca, 0x60], [0x63, 0xcb, 0x5f], [0x65, 0xcb, 0x5e],
    [0x67, 0xcc, 0x5c], [0x69, 0xcd, 0x5b], [0x6c, 0xcd, 0x5a], [0x6e, 0xce, 0x58],
    [0x70, 0xcf, 0x57], [0x73, 0xd0, 0x56], [0x75, 0xd0, 0x54], [0x77, 0xd1, 0x53],
    [0x7a, 0xd1, 0x51], [0x7c, 0xd2, 0x50], [0x7f, 0xd3, 0x4e], [0x81, 0xd3, 0x4d],
    [0x84, 0xd4, 0x4b], [0x86, 0xd5, 0x49], [0x89, 0xd5, 0x48], [0x8b, 0xd6, 0x46],
    [0x8e, 0xd6, 0x45], [0x90, 0xd7, 0x43], [0x93, 0xd7, 0x41], [0x95, 0xd8, 0x40],
    [0x98, 0xd8, 0x3e], [0x9b, 0xd9, 0x3c], [0x9d, 0xd9, 0x3b], [0xa0, 0xda, 0x39],
    [0xa2, 0xda, 0x37], [0xa5, 0xdb, 0x36], [0xa8, 0xdb, 0x34], [0xaa, 0xdc, 0x32],
    [0xad, 0xdc, 0x30], [0xb0, 0xdd, 0x2f], [0xb2, 0xdd, 0x2d], [0xb5, 0xde, 0x2b],
    [0xb8, 0xde, 0x29], [0xba, 0xde, 0x28], [0xbd, 0xdf, 0x26], [0xc0, 0xdf, 0x25],
    [0xc2, 0xdf, 0x23], [0xc5, 0xe0, 0x21], [0xc8, 0xe0, 0x20], [0xca, 0xe1, 0x1f],
    [0xcd, 0xe1, 0x1d], [0xd0, 0xe1, 0x1c], [0xd2, 0xe2, 0x1b], [0xd5, 0xe2, 0x1a],
    [0xd8, 0xe2, 0x19], [0xda, 0xe3, 0x19], [0xdd, 0xe3, 0x18], [0xdf, 0xe3, 0x18],
    [0xe2, 0xe4, 0x18], [0xe5, 0xe4, 0x19], [0xe7, 0xe4, 0x19], [0xea, 0xe5, 0x1a],
    [0xec, 0xe5, 0x1b], [0xef, 0xe5, 0x1c], [0xf1, 0xe5, 0x1d], [0xf4, 0xe6, 0x1e],
    [0xf6, 0xe6, 0x20], [0xf8, 0xe6, 0x21], [0xfb, 0xe7, 0x23], [0xfd, 0xe7, 0x25],
];

// ---------------------------------------------------------------------------
// Index mapping
// ---------------------------------------------------------------------------

/// Map an iteration count to a palette position.
///
/// The count is placed on a log₁₀ ramp (256 palette steps per decade) that is
/// folded into a triangle wave, so colors run up the palette for one decade
/// and back down the next. Zero iterations sit at the start of the ramp and
/// the single out-of-range fold value clamps to 0.
#[inline]
pub fn palette_index(iterations: u32) -> usize {
    if iterations == 0 {
        return 0;
    }
    let folded = ((iterations as f64).log10() * 256.0) % 512.0;
    (255 - (folded as i32 - 255).abs()).max(0) as usize
}

// ---------------------------------------------------------------------------
// Color mapper
// ---------------------------------------------------------------------------

/// Iteration counts at or above this are colored without the memo table.
pub const CACHE_LIMIT: usize = 1 << 20;

/// Resolves iteration counts to colors, memoizing each count's color.
///
/// The cache is keyed by iteration count alone. The interior cutoff is
/// applied before the cache is consulted, so changing `max_iterations`
/// between calls never invalidates or corrupts cached entries; the cache only
/// grows to the highest escaping count seen, up to [`CACHE_LIMIT`].
#[derive(Debug, Clone)]
pub struct ColorMapper {
    palette: &'static [Rgb; LUT_SIZE],
    cache: Vec<Option<Rgb>>,
}

impl ColorMapper {
    pub fn new() -> Self {
        Self::with_palette(&VIRIDIS)
    }

    pub fn with_palette(palette: &'static [Rgb; LUT_SIZE]) -> Self {
        Self {
            palette,
            cache: Vec::new(),
        }
    }

    /// The color for `iterations` under an iteration cap of `max_iterations`.
    pub fn color_of(&mut self, iterations: u32, max_iterations: u32) -> Rgb {
        if iterations >= max_iterations {
            return INTERIOR;
        }
        let idx = iterations as usize;
        if idx >= CACHE_LIMIT {
            return self.palette[palette_index(iterations)];
        }
        if idx >= self.cache.len() {
            self.cache.resize(idx + 1, None);
        }
        let palette = self.palette;
        *self.cache[idx].get_or_insert_with(|| palette[palette_index(iterations)])
    }

    /// Uncached variant of [`color_of`](Self::color_of), usable through a
    /// shared reference.
    pub fn lookup(&self, iterations: u32, max_iterations: u32) -> Rgb {
        if iterations >= max_iterations {
            return INTERIOR;
        }
        self.palette[palette_index(iterations)]
    }

    /// Number of iteration counts the cache currently has room for.
    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }
}

impl Default for ColorMapper {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
