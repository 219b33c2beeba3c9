//! In-progress freehand stroke capture.

use crate::shapes::{Stroke, StrokeTool};
use kurbo::Point;

/// Stroke being drawn. Points are added only when the pointer moved far enough.
#[derive(Debug, Clone)]
pub struct StrokeCapture {
    stroke: Stroke,
    min_distance: f64,
}

impl StrokeCapture {
    pub fn new(
        start: Point,
        color: impl Into<String>,
        size: f64,
        tool: StrokeTool,
        min_distance: f64,
    ) -> Self {
        Self {
            stroke: Stroke::new(start, color, size, tool),
            min_distance: min_distance.max(0.0),
        }
    }

    /// Append a point if it is farther than the sampling distance from the last one.
    pub fn extend(&mut self, point: Point) -> bool {
        let far_enough = match self.stroke.last_point() {
            Some(last) => (point - last).hypot() > self.min_distance,
            None => true,
        };
        if far_enough {
            self.stroke.points.push(point);
        }
        far_enough
    }

    /// Stroke so far, for previews.
    pub fn stroke(&self) -> &Stroke {
        &self.stroke
    }

    /// Finalize. Strokes with fewer than 2 points are discarded.
    pub fn finish(self) -> Option<Stroke> {
        (self.stroke.len() >= 2).then_some(self.stroke)
    }
}
