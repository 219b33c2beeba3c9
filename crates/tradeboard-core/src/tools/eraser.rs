//! Whole-stroke eraser gesture.

use crate::shapes::Stroke;
use kurbo::Point;

/// One eraser drag. Tracks the previous sample so each movement tests the
/// swept footprint, and whether the gesture has already recorded history.
#[derive(Debug, Clone)]
pub struct EraserGesture {
    radius: f64,
    last: Option<Point>,
    recorded: bool,
}

impl EraserGesture {
    pub fn new(radius: f64) -> Self {
        Self {
            radius: radius.max(0.0),
            last: None,
            recorded: false,
        }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Whether a history snapshot was already taken for this gesture.
    pub fn has_recorded(&self) -> bool {
        self.recorded
    }

    pub fn mark_recorded(&mut self) {
        self.recorded = true;
    }

    /// Advance the footprint to `point` and return indices of strokes it touches,
    /// in ascending order.
    pub fn sweep(&mut self, point: Point, strokes: &[Stroke]) -> Vec<usize> {
        let from = self.last.replace(point).unwrap_or(point);
        strokes
            .iter()
            .enumerate()
            .filter(|(_, stroke)| stroke.intersects_capsule(from, point, self.radius))
            .map(|(i, _)| i)
            .collect()
    }
}
