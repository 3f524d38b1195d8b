//! Drag-to-zoom selection.
//!
//! Selections are measured in display pixels. The backing raster may be
//! denser than the display (`pixel_ratio` backing pixels per display pixel),
//! which is why the offset update scales the rectangle corner by the ratio.

use crate::error::CoreError;
use crate::viewport::Viewport;

/// A pointer position in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragPoint {
    pub x: f64,
    pub y: f64,
}

impl DragPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Backing raster dimensions plus the display-to-backing pixel ratio.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Canvas {
    /// Backing raster width in pixels.
    pub width: u32,
    /// Backing raster height in pixels.
    pub height: u32,
    /// Backing pixels per display pixel along each axis.
    pub pixel_ratio: f64,
}

/// An aspect-locked selection rectangle in display pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Canvas {
    pub fn new(width: u32, height: u32, pixel_ratio: f64) -> crate::Result<Self> {
        if width == 0 || height == 0 {
            return Err(CoreError::InvalidDimensions { width, height });
        }
        if pixel_ratio <= 0.0 || !pixel_ratio.is_finite() {
            return Err(CoreError::InvalidViewport {
                reason: format!("pixel ratio must be positive and finite, got {pixel_ratio}"),
            });
        }
        Ok(Self {
            width,
            height,
            pixel_ratio,
        })
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Canvas width in display pixels.
    pub fn display_width(&self) -> f64 {
        self.width as f64 / self.pixel_ratio
    }

    /// Canvas height in display pixels.
    pub fn display_height(&self) -> f64 {
        self.height as f64 / self.pixel_ratio
    }

    /// Turn a drag from `origin` to `current` into an aspect-locked rectangle.
    ///
    /// The shorter side of the dragged box grows until the box matches the
    /// canvas aspect ratio. The corner at `origin` never moves: the rectangle
    /// extends toward whichever side `current` lies on.
    pub fn lock_aspect(&self, origin: DragPoint, current: DragPoint) -> SelectionRect {
        let box_width = (current.x - origin.x).abs();
        let box_height = (current.y - origin.y).abs();

        let ratio = self.aspect_ratio();
        let (width, height) = if ratio < box_width / box_height {
            (box_width, box_width / ratio)
        } else {
            (box_height * ratio, box_height)
        };

        SelectionRect {
            left: if current.x > origin.x {
                origin.x
            } else {
                origin.x - width
            },
            top: if current.y > origin.y {
                origin.y
            } else {
                origin.y - height
            },
            width,
            height,
        }
    }

    /// Like [`lock_aspect`](Self::lock_aspect) but rejects drags that enclose
    /// no area, which would otherwise divide by zero when rescaling.
    pub fn select(&self, origin: DragPoint, current: DragPoint) -> crate::Result<SelectionRect> {
        let box_width = (current.x - origin.x).abs();
        let box_height = (current.y - origin.y).abs();
        if !(box_width > 0.0 && box_height > 0.0) {
            return Err(CoreError::DegenerateSelection {
                width: box_width,
                height: box_height,
            });
        }
        let rect = self.lock_aspect(origin, current);
        rect.check()?;
        Ok(rect)
    }
}

impl SelectionRect {
    /// A rectangle is usable when both sides are positive and finite.
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
            || !self.width.is_finite()
            || !self.height.is_finite()
            || !self.left.is_finite()
            || !self.top.is_finite()
    }

    fn check(&self) -> crate::Result<()> {
        if self.is_degenerate() {
            return Err(CoreError::DegenerateSelection {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// The same rectangle in backing-raster pixels: `(x, y, width, height)`.
    pub fn to_backing(&self, canvas: &Canvas) -> (f64, f64, f64, f64) {
        let r = canvas.pixel_ratio;
        (self.left * r, self.top * r, self.width * r, self.height * r)
    }
}

impl Viewport {
    /// The viewport that shows `rect` across the whole canvas.
    ///
    /// `rect` should already be aspect-locked (see [`Canvas::select`]); a
    /// degenerate rectangle is rejected and leaves the caller's viewport as is.
    pub fn zoom_to_rect(&self, rect: &SelectionRect, canvas: &Canvas) -> crate::Result<Self> {
        rect.check()?;
        let offset_x = self.offset_x + rect.left * canvas.pixel_ratio / self.scale;
        let offset_y = self.offset_y + rect.top * canvas.pixel_ratio / self.scale;
        let scale = self.scale * (canvas.display_width() / rect.width);
        Self::new(offset_x, offset_y, scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    fn canvas() -> Canvas {
        // 400×300 display at 2× density.
        Canvas::new(800, 600, 2.0).unwrap()
    }

    #[test]
    fn narrow_drag_grows_width() {
        let c = canvas();
        let rect = c.lock_aspect(DragPoint::new(10.0, 20.0), DragPoint::new(50.0, 120.0));
        assert!((rect.height - 100.0).abs() < EPSILON);
        assert!((rect.width - 100.0 * 4.0 / 3.0).abs() < EPSILON);
    }

    #[test]
    fn wide_drag_grows_height_to_match() {
        let c = canvas();
        let rect = c.lock_aspect(DragPoint::new(10.0, 20.0), DragPoint::new(210.0, 40.0));
        assert!((rect.width - 200.0).abs() < EPSILON);
        assert!((rect.height - 150.0).abs() < EPSILON);
    }

    #[test]
    fn tall_drag_grows_width_to_match() {
        let c = canvas();
        let rect = c.lock_aspect(DragPoint::new(100.0, 100.0), DragPoint::new(110.0, 160.0));
        assert!((rect.height - 60.0).abs() < EPSILON);
        assert!((rect.width - 80.0).abs() < EPSILON);
    }

    #[test]
    fn locked_rect_matches_canvas_aspect() {
        let c = canvas();
        for (dx, dy) in [(5.0, 90.0), (90.0, 5.0), (-40.0, 30.0), (33.0, -77.0)] {
            let origin = DragPoint::new(200.0, 150.0);
            let rect = c.lock_aspect(origin, DragPoint::new(200.0 + dx, 150.0 + dy));
            assert!((rect.width / rect.height - c.aspect_ratio()).abs() < EPSILON);
            // Never shrinks below the dragged box.
            assert!(rect.width >= f64::abs(dx) - EPSILON);
            assert!(rect.height >= f64::abs(dy) - EPSILON);
        }
    }

    #[test]
    fn drag_origin_stays_fixed() {
        let c = canvas();
        let origin = DragPoint::new(200.0, 150.0);

        let down_right = c.lock_aspect(origin, DragPoint::new(220.0, 250.0));
        assert_eq!((down_right.left, down_right.top), (200.0, 150.0));

        let up_left = c.lock_aspect(origin, DragPoint::new(180.0, 50.0));
        assert!((up_left.left + up_left.width - 200.0).abs() < EPSILON);
        assert!((up_left.top + up_left.height - 150.0).abs() < EPSILON);

        let up_right = c.lock_aspect(origin, DragPoint::new(260.0, 140.0));
        assert_eq!(up_right.left, 200.0);
        assert!((up_right.top + up_right.height - 150.0).abs() < EPSILON);
    }

    #[test]
    fn zero_area_drag_is_rejected() {
        let c = canvas();
        let p = DragPoint::new(10.0, 10.0);
        assert!(c.select(p, p).is_err());
        assert!(c.select(p, DragPoint::new(50.0, 10.0)).is_err());
        assert!(c.select(p, DragPoint::new(10.0, 50.0)).is_err());
        assert!(c.select(p, DragPoint::new(50.0, 50.0)).is_ok());
    }

    #[test]
    fn zoom_to_rect_rejects_degenerate() {
        let vp = Viewport::default_for(800, 600);
        let rect = SelectionRect {
            left: 10.0,
            top: 10.0,
            width: 0.0,
            height: 0.0,
        };
        assert!(vp.zoom_to_rect(&rect, &canvas()).is_err());
    }

    #[test]
    fn zoom_to_rect_maps_selection_to_full_canvas() {
        let c = canvas();
        let vp = Viewport::default_for(c.width, c.height);
        let rect = c
            .select(DragPoint::new(100.0, 75.0), DragPoint::new(200.0, 150.0))
            .unwrap();
        let zoomed = vp.zoom_to_rect(&rect, &c).unwrap();

        // Whole display is 400 wide, selection is 100 → 4× zoom.
        assert!((zoomed.scale - vp.scale * 4.0).abs() < EPSILON);

        // The selection's top-left (in backing pixels) becomes the new origin.
        let (bx, by, bw, bh) = rect.to_backing(&c);
        let (ox, oy) = vp.pixel_to_plane(bx, by);
        assert!((zoomed.offset_x - ox).abs() < EPSILON);
        assert!((zoomed.offset_y - oy).abs() < EPSILON);

        // And its bottom-right lands on the far canvas corner.
        let (ex, ey) = vp.pixel_to_plane(bx + bw, by + bh);
        let (px, py) = zoomed.plane_to_pixel(ex, ey);
        assert!((px - c.width as f64).abs() < 1e-6);
        assert!((py - c.height as f64).abs() < 1e-6);
    }

    #[test]
    fn unit_pixel_ratio() {
        let c = Canvas::new(400, 300, 1.0).unwrap();
        let vp = Viewport::new(0.0, 0.0, 100.0).unwrap();
        let rect = c
            .select(DragPoint::new(40.0, 30.0), DragPoint::new(240.0, 180.0))
            .unwrap();
        let zoomed = vp.zoom_to_rect(&rect, &c).unwrap();
        assert!((zoomed.offset_x - 0.4).abs() < EPSILON);
        assert!((zoomed.offset_y - 0.3).abs() < EPSILON);
        assert!((zoomed.scale - 200.0).abs() < EPSILON);
    }

    #[test]
    fn invalid_canvas() {
        assert!(Canvas::new(0, 10, 1.0).is_err());
        assert!(Canvas::new(10, 10, 0.0).is_err());
    }
}
