//! Freehand stroke element.

use super::{Element, point_to_polyline_dist, point_to_segment_dist, segment_to_segment_dist};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Tool that produced a stroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeTool {
    #[default]
    Pen,
    Eraser,
}

/// A freehand polyline with uniform color, size and tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    /// Points in canvas coordinates.
    pub points: Vec<Point>,
    /// CSS color string.
    pub color: String,
    /// Stroke width in canvas units.
    pub size: f64,
    pub tool: StrokeTool,
}

impl Stroke {
    /// Create a stroke with a single starting point.
    pub fn new(start: Point, color: impl Into<String>, size: f64, tool: StrokeTool) -> Self {
        Self {
            points: vec![start],
            color: color.into(),
            size,
            tool,
        }
    }

    /// Create from existing points.
    pub fn from_points(points: Vec<Point>, color: impl Into<String>, size: f64) -> Self {
        Self {
            points,
            color: color.into(),
            size,
            tool: StrokeTool::Pen,
        }
    }

    /// Get the number of points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the path is empty.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Last recorded point.
    pub fn last_point(&self) -> Option<Point> {
        self.points.last().copied()
    }

    /// Whether any segment comes within `radius` of `center`.
    pub fn intersects_circle(&self, center: Point, radius: f64) -> bool {
        point_to_polyline_dist(center, &self.points) <= radius
    }

    /// Whether any segment comes within `radius` of the segment `from`→`to`.
    ///
    /// This is the footprint of a circle swept between two pointer samples.
    pub fn intersects_capsule(&self, from: Point, to: Point, radius: f64) -> bool {
        match self.points.as_slice() {
            [] => false,
            [single] => point_to_segment_dist(*single, from, to) <= radius,
            points => points
                .windows(2)
                .any(|w| segment_to_segment_dist(w[0], w[1], from, to) <= radius),
        }
    }
}

impl Element for Stroke {
    fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        let rect = self
            .points
            .iter()
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p));
        let half = self.size / 2.0;
        rect.inflate(half, half)
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        point_to_polyline_dist(point, &self.points) <= tolerance + self.size / 2.0
    }

    fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }
}
