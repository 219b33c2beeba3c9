//! Tool system for the whiteboard.

mod eraser;
mod freehand;
mod shortcuts;

pub use eraser::EraserGesture;
pub use freehand::StrokeCapture;
pub use shortcuts::{Action, ShortcutConfig, Shortcuts};

use crate::config::EngineConfig;
use crate::shapes::{Stroke, StrokeTool};
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    Pen,
    Eraser,
    #[default]
    Cursor,
    Text,
}

impl ToolKind {
    /// Tool selected by an action, if the action is a tool switch.
    pub fn from_action(action: Action) -> Option<Self> {
        match action {
            Action::Pen => Some(ToolKind::Pen),
            Action::Eraser => Some(ToolKind::Eraser),
            Action::Cursor => Some(ToolKind::Cursor),
            Action::Text => Some(ToolKind::Text),
            _ => None,
        }
    }
}

/// Style applied to new strokes and text.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolStyle {
    pub color: String,
    pub size: f64,
    pub eraser_size: f64,
    pub font_size: f64,
}

impl ToolStyle {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            color: config.pen_color.clone(),
            size: config.pen_size,
            eraser_size: config.eraser_size,
            font_size: config.font_size,
        }
    }
}

impl Default for ToolStyle {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Manages the current tool and its in-progress gesture.
#[derive(Debug, Clone)]
pub struct ToolManager {
    /// Currently selected tool.
    pub current_tool: ToolKind,
    /// Current style to apply to new elements.
    pub style: ToolStyle,
    capture: Option<StrokeCapture>,
    eraser: Option<EraserGesture>,
    min_distance: f64,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl ToolManager {
    /// Create a new tool manager.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            current_tool: ToolKind::default(),
            style: ToolStyle::from_config(config),
            capture: None,
            eraser: None,
            min_distance: config.min_stroke_distance,
        }
    }

    /// Set the current tool, dropping any unfinished gesture. Returns the previous tool.
    pub fn set_tool(&mut self, tool: ToolKind) -> ToolKind {
        self.cancel();
        std::mem::replace(&mut self.current_tool, tool)
    }

    /// Start capturing a stroke at a canvas point.
    pub fn begin_stroke(&mut self, point: Point, tool: StrokeTool) {
        self.capture = Some(StrokeCapture::new(
            point,
            self.style.color.clone(),
            self.style.size,
            tool,
            self.min_distance,
        ));
    }

    /// Add a sample to the current stroke. Returns true if the point was kept.
    pub fn extend_stroke(&mut self, point: Point) -> bool {
        self.capture.as_mut().is_some_and(|capture| capture.extend(point))
    }

    /// End the current stroke, returning it if it has enough points.
    pub fn finish_stroke(&mut self) -> Option<Stroke> {
        self.capture.take().and_then(StrokeCapture::finish)
    }

    /// Stroke currently being drawn.
    pub fn preview(&self) -> Option<&Stroke> {
        self.capture.as_ref().map(StrokeCapture::stroke)
    }

    pub fn begin_erase(&mut self) -> &mut EraserGesture {
        self.eraser.insert(EraserGesture::new(self.style.eraser_size))
    }

    pub fn eraser_mut(&mut self) -> Option<&mut EraserGesture> {
        self.eraser.as_mut()
    }

    pub fn finish_erase(&mut self) -> Option<EraserGesture> {
        self.eraser.take()
    }

    /// Whether a stroke or eraser gesture is in progress.
    pub fn is_active(&self) -> bool {
        self.capture.is_some() || self.eraser.is_some()
    }

    /// Drop any in-progress gesture.
    pub fn cancel(&mut self) {
        self.capture = None;
        self.eraser = None;
    }
}
