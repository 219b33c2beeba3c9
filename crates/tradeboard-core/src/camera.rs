//! Camera module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Default lower bound for the zoom scale.
pub const DEFAULT_MIN_SCALE: f64 = 0.1;
/// Default upper bound for the zoom scale.
pub const DEFAULT_MAX_SCALE: f64 = 10.0;

/// Persisted viewport state of a canvas.
///
/// `screen = canvas * scale + offset`, with `offset` in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransformState {
    /// Zoom factor (always > 0).
    pub scale: f64,
    /// Screen-space translation.
    pub offset: Point,
}

impl Default for TransformState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: Point::ZERO,
        }
    }
}

/// Camera manages the view transform for the canvas.
///
/// It handles panning (translation) and zooming (scaling) operations,
/// converting between screen coordinates and canvas coordinates.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Current translation offset (pan), in screen pixels.
    pub offset: Point,
    /// Current zoom level.
    pub scale: f64,
    /// Minimum allowed zoom level.
    pub min_scale: f64,
    /// Maximum allowed zoom level.
    pub max_scale: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::with_limits(DEFAULT_MIN_SCALE, DEFAULT_MAX_SCALE)
    }
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a camera with a custom zoom range.
    pub fn with_limits(min_scale: f64, max_scale: f64) -> Self {
        Self {
            offset: Point::ZERO,
            scale: 1.0,
            min_scale,
            max_scale,
        }
    }

    /// Snapshot of the persisted part of the camera.
    pub fn state(&self) -> TransformState {
        TransformState {
            scale: self.scale,
            offset: self.offset,
        }
    }

    /// Restore a persisted transform. Out-of-range or invalid scales are clamped.
    pub fn set_state(&mut self, state: TransformState) {
        self.scale = if state.scale.is_finite() && state.scale > 0.0 {
            state.scale.clamp(self.min_scale, self.max_scale)
        } else {
            1.0
        };
        self.offset = state.offset;
    }

    /// Get the affine transform for rendering.
    ///
    /// This transform converts canvas coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.offset.to_vec2()) * Affine::scale(self.scale)
    }

    /// Get the inverse transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(-self.offset.to_vec2())
    }

    /// Convert a screen point to canvas coordinates.
    pub fn to_canvas(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.offset.x) / self.scale,
            (screen_point.y - self.offset.y) / self.scale,
        )
    }

    /// Convert a canvas point to screen coordinates.
    pub fn to_screen(&self, canvas_point: Point) -> Point {
        Point::new(
            canvas_point.x * self.scale + self.offset.x,
            canvas_point.y * self.scale + self.offset.y,
        )
    }

    /// Pan the camera by a delta in screen coordinates.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.offset += delta;
    }

    /// Zoom the camera by a multiplicative factor, keeping the given screen point fixed.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }

        // Canvas point under the cursor before the zoom
        let anchor = self.to_canvas(screen_point);
        self.scale = new_scale;

        // Re-solve the offset so the anchor maps back onto the cursor
        self.offset = Point::new(
            screen_point.x - anchor.x * self.scale,
            screen_point.y - anchor.y * self.scale,
        );
    }

    /// Reset camera to the origin at 100%.
    pub fn reset(&mut self) {
        self.offset = Point::ZERO;
        self.scale = 1.0;
    }

    /// Fit the camera to show the given bounding box.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, padding: f64) {
        if bounds.is_zero_area() {
            self.reset();
            return;
        }

        let padded_viewport = Size::new(
            (viewport.width - padding * 2.0).max(1.0),
            (viewport.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded_viewport.width / bounds.width();
        let scale_y = padded_viewport.height / bounds.height();
        self.scale = scale_x.min(scale_y).clamp(self.min_scale, self.max_scale);

        // Center the bounds in the viewport
        let bounds_center = bounds.center();
        self.offset = Point::new(
            viewport.width / 2.0 - bounds_center.x * self.scale,
            viewport.height / 2.0 - bounds_center.y * self.scale,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Point, b: Point) {
        assert!((a.x - b.x).abs() < 1e-9, "{a:?} != {b:?}");
        assert!((a.y - b.y).abs() < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_default_camera() {
        let camera = Camera::new();
        assert_eq!(camera.offset, Point::ZERO);
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_to_canvas_with_offset_and_scale() {
        let mut camera = Camera::new();
        camera.offset = Point::new(50.0, 100.0);
        camera.scale = 2.0;
        let canvas = camera.to_canvas(Point::new(150.0, 300.0));
        assert_close(canvas, Point::new(50.0, 100.0));
    }

    #[test]
    fn test_roundtrip_conversion() {
        let mut camera = Camera::new();
        camera.offset = Point::new(30.0, -20.0);
        camera.scale = 1.5;

        for p in [Point::new(123.0, 456.0), Point::new(-7.5, 0.25), Point::ZERO] {
            assert_close(camera.to_screen(camera.to_canvas(p)), p);
            assert_close(camera.to_canvas(camera.to_screen(p)), p);
        }
    }

    #[test]
    fn test_affine_matches_direct_mapping() {
        let mut camera = Camera::new();
        camera.offset = Point::new(12.0, 34.0);
        camera.scale = 0.75;
        let p = Point::new(40.0, -8.0);
        assert_close(camera.transform() * p, camera.to_screen(p));
        assert_close(camera.inverse_transform() * p, camera.to_canvas(p));
    }

    #[test]
    fn test_zoom_keeps_point_fixed() {
        let mut camera = Camera::new();
        camera.offset = Point::new(10.0, 20.0);
        let cursor = Point::new(300.0, 200.0);
        let under_cursor = camera.to_canvas(cursor);

        camera.zoom_at(cursor, 2.5);
        assert!((camera.scale - 2.5).abs() < 1e-12);
        assert_close(camera.to_screen(under_cursor), cursor);
        assert_close(camera.to_screen(camera.to_canvas(cursor)), cursor);
    }

    #[test]
    fn test_zoom_clamp_preserves_fixed_point() {
        let mut camera = Camera::new();
        let cursor = Point::new(80.0, 60.0);
        let under_cursor = camera.to_canvas(cursor);

        camera.zoom_at(cursor, 0.001); // Try to zoom way out
        assert!((camera.scale - camera.min_scale).abs() < f64::EPSILON);
        assert_close(camera.to_screen(under_cursor), cursor);

        camera.zoom_at(cursor, 1000.0); // Try to zoom way in
        assert!((camera.scale - camera.max_scale).abs() < f64::EPSILON);
        assert_close(camera.to_screen(under_cursor), cursor);
    }

    #[test]
    fn test_zoom_ignores_invalid_factor() {
        let mut camera = Camera::new();
        camera.zoom_at(Point::ZERO, 0.0);
        camera.zoom_at(Point::ZERO, f64::NAN);
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pan() {
        let mut camera = Camera::new();
        camera.scale = 2.0;
        camera.pan_by(Vec2::new(10.0, 20.0));
        assert_close(camera.offset, Point::new(10.0, 20.0));
    }

    #[test]
    fn test_set_state_clamps_scale() {
        let mut camera = Camera::new();
        camera.set_state(TransformState {
            scale: 500.0,
            offset: Point::new(1.0, 2.0),
        });
        assert!((camera.scale - camera.max_scale).abs() < f64::EPSILON);
        camera.set_state(TransformState {
            scale: -1.0,
            offset: Point::ZERO,
        });
        assert!((camera.scale - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut camera = Camera::new();
        let bounds = Rect::new(0.0, 0.0, 100.0, 50.0);
        camera.fit_to_bounds(bounds, Size::new(400.0, 300.0), 0.0);
        assert!((camera.scale - 4.0).abs() < 1e-12);
        assert_close(camera.to_screen(bounds.center()), Point::new(200.0, 150.0));
    }
}
