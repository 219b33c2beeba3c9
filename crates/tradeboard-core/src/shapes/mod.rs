//! Element definitions for the whiteboard.

mod stroke;
mod text;

pub use stroke::{Stroke, StrokeTool};
pub use text::{ListType, RunStyle, TextBounds, TextElement, TextRun, TextUpdate};

use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Reference to an element of the live canvas.
///
/// Strokes have no identity in the persisted format, so they are addressed by
/// their z-order position. Text elements carry a stable id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ElementRef {
    Stroke(usize),
    Text(String),
}

impl ElementRef {
    pub fn is_text(&self) -> bool {
        matches!(self, ElementRef::Text(_))
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    let proj = a + seg * t;
    (point - proj).hypot()
}

/// Minimum distance from a point to a polyline (sequence of connected segments).
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    match points {
        [] => f64::INFINITY,
        [single] => (point - *single).hypot(),
        _ => points
            .windows(2)
            .map(|w| point_to_segment_dist(point, w[0], w[1]))
            .fold(f64::INFINITY, f64::min),
    }
}

/// Minimum distance between two line segments (a0→a1 and b0→b1).
pub fn segment_to_segment_dist(a0: Point, a1: Point, b0: Point, b1: Point) -> f64 {
    if segments_intersect(a0, a1, b0, b1) {
        return 0.0;
    }
    point_to_segment_dist(a0, b0, b1)
        .min(point_to_segment_dist(a1, b0, b1))
        .min(point_to_segment_dist(b0, a0, a1))
        .min(point_to_segment_dist(b1, a0, a1))
}

fn segments_intersect(a0: Point, a1: Point, b0: Point, b1: Point) -> bool {
    let d1 = (a1 - a0).cross(b0 - a0);
    let d2 = (a1 - a0).cross(b1 - a0);
    let d3 = (b1 - b0).cross(a0 - b0);
    let d4 = (b1 - b0).cross(a1 - b0);
    d1 * d2 < 0.0 && d3 * d4 < 0.0
}

/// Whether two rectangles overlap, touching edges included.
pub fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Common behavior of canvas elements.
pub trait Element {
    /// Get the bounding box in canvas coordinates.
    fn bounds(&self) -> Rect;

    /// Check if a point (in canvas coordinates) hits this element.
    fn hit_test(&self, point: Point, tolerance: f64) -> bool;

    /// Move the element by a canvas-space delta.
    fn translate(&mut self, delta: Vec2);
}
