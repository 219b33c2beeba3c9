//! Renderer trait abstraction.

use kurbo::{Rect, Size};
use peniko::Color;
use thiserror::Error;
use tradeboard_core::canvas::Canvas;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid surface: {0}")]
    InvalidSurface(String),
    #[error("Render failed: {0}")]
    RenderFailed(String),
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// Viewport size in pixels.
    pub viewport_size: Size,
    /// Background color. Eraser strokes paint in this color.
    pub background_color: Color,
    /// Selection highlight color.
    pub selection_color: Color,
    /// Selection rectangle (marquee) in canvas coordinates.
    pub selection_rect: Option<Rect>,
    /// Skip selection and edit outlines.
    pub hide_ui: bool,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(canvas: &'a Canvas, viewport_size: Size) -> Self {
        Self {
            canvas,
            viewport_size,
            background_color: Color::WHITE,
            selection_color: Color::from_rgba8(59, 130, 246, 255),
            selection_rect: None,
            hide_ui: false,
        }
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.background_color = color;
        self
    }

    /// Set the selection highlight color.
    pub fn with_selection_color(mut self, color: Color) -> Self {
        self.selection_color = color;
        self
    }

    /// Set the selection rectangle.
    pub fn with_selection_rect(mut self, rect: Option<Rect>) -> Self {
        self.selection_rect = rect;
        self
    }

    pub fn with_hide_ui(mut self, hide_ui: bool) -> Self {
        self.hide_ui = hide_ui;
        self
    }
}

/// Trait for rendering backends.
pub trait Renderer: Send + Sync {
    /// Paint one frame of the live canvas.
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()>;

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.background_color
    }
}
