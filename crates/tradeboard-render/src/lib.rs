//! Tradeboard Render Library
//!
//! Renderer abstraction and a software rasterizer for Tradeboard canvases.
//! Rendered frames double as the surface for thumbnail capture.

pub mod color;
mod pixmap;
mod renderer;

pub use color::{parse_color, try_parse_color};
pub use pixmap::{Pixmap, PixmapRenderer};
pub use renderer::{RenderContext, RenderResult, Renderer, RendererError};
