use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;

/// Affine mapping between canvas pixels and the fractal plane.
///
/// A pixel `(px, py)` maps to `(px / scale + offset_x, py / scale + offset_y)`,
/// so `scale` is pixels per plane unit and the offsets are the plane
/// coordinates of the top-left pixel. The y-axis grows downward in both spaces.
///
/// Viewports are replaced wholesale on every pan, zoom, or history step and
/// are never mutated while a render that captured them is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Viewport {
    pub offset_x: f64,
    pub offset_y: f64,
    /// Pixels per plane unit. Always positive and finite.
    pub scale: f64,
}

/// An axis-aligned rectangle on the fractal plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Create a viewport with explicit parameters.
    pub fn new(offset_x: f64, offset_y: f64, scale: f64) -> crate::Result<Self> {
        if scale <= 0.0 || !scale.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("scale must be positive and finite, got {scale}"),
            });
        }
        if !offset_x.is_finite() || !offset_y.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("offset must be finite, got ({offset_x}, {offset_y})"),
            });
        }
        Ok(Self {
            offset_x,
            offset_y,
            scale,
        })
    }

    /// Startup view: the shorter canvas side spans three plane units and the
    /// canvas centre sits on `(-0.75, 0)`, which frames the whole set.
    pub fn default_for(width: u32, height: u32) -> Self {
        let scale = width.min(height).max(1) as f64 / 3.0;
        Self {
            offset_x: -(width as f64 / 2.0 / scale) - 0.75,
            offset_y: -(height as f64 / 2.0 / scale),
            scale,
        }
    }

    /// Map a (possibly fractional) pixel position to plane coordinates.
    #[inline]
    pub fn pixel_to_plane(&self, px: f64, py: f64) -> (f64, f64) {
        (px / self.scale + self.offset_x, py / self.scale + self.offset_y)
    }

    /// Inverse of [`pixel_to_plane`](Self::pixel_to_plane).
    #[inline]
    pub fn plane_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset_x) * self.scale, (y - self.offset_y) * self.scale)
    }

    /// Plane y-coordinate of the first row of a band starting at `y_start`.
    ///
    /// Workers receive this as their own `offset_y` so each band can be
    /// computed without knowing where it sits in the frame.
    #[inline]
    pub fn band_origin_y(&self, y_start: u32) -> f64 {
        y_start as f64 / self.scale + self.offset_y
    }

    /// The plane region covered by a `width`×`height` canvas.
    pub fn visible_rect(&self, width: u32, height: u32) -> PlaneRect {
        PlaneRect {
            x: self.offset_x,
            y: self.offset_y,
            width: width as f64 / self.scale,
            height: height as f64 / self.scale,
        }
    }

    /// Build the viewport that shows `rect` on a `width`×`height` canvas.
    ///
    /// The rectangle is fitted entirely inside the canvas and centred along
    /// the axis with spare room.
    pub fn fit_plane_rect(rect: &PlaneRect, width: u32, height: u32) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if rect.width <= 0.0 || rect.height <= 0.0 {
            return Err(CoreError::InvalidViewport {
                reason: format!("plane rect must have positive area, got {rect:?}"),
            });
        }
        let scale = (width as f64 / rect.width).min(height as f64 / rect.height);
        let spare_x = width as f64 / scale - rect.width;
        let spare_y = height as f64 / scale - rect.height;
        Self::new(rect.x - spare_x / 2.0, rect.y - spare_y / 2.0, scale)
    }

    /// Encode as a shareable query string (`x=…&y=…&scale=…`).
    ///
    /// `f64`'s `Display` emits the shortest representation that parses back
    /// to the same value, so [`from_query`](Self::from_query) is exact.
    pub fn to_query(&self) -> String {
        format!("x={}&y={}&scale={}", self.offset_x, self.offset_y, self.scale)
    }

    /// Decode a query string, filling absent values from
    /// [`default_for`](Self::default_for).
    ///
    /// A leading `?` is accepted and unknown keys are ignored. The offsets
    /// default relative to the decoded scale, as they do at startup.
    pub fn from_query(query: &str, width: u32, height: u32) -> crate::Result<Self> {
        let mut x = None;
        let mut y = None;
        let mut scale = None;

        for pair in query.trim_start_matches('?').split('&') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let slot = match key {
                "x" => &mut x,
                "y" => &mut y,
                "scale" => &mut scale,
                _ => {
                    debug!(key, "Ignoring unknown query parameter");
                    continue;
                }
            };
            *slot = Some(parse_param(key, value)?);
        }

        let scale = scale.unwrap_or_else(|| Self::default_for(width, height).scale);
        let offset_x = x.unwrap_or(-(width as f64 / 2.0 / scale) - 0.75);
        let offset_y = y.unwrap_or(-(height as f64 / 2.0 / scale));
        Self::new(offset_x, offset_y, scale)
    }
}

fn parse_param(key: &str, value: &str) -> crate::Result<f64> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(CoreError::InvalidQuery {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}
