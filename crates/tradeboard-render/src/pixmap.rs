//! Software renderer painting into an RGBA pixmap.

use crate::color::{parse_color, to_skia, with_alpha};
use crate::renderer::{RenderContext, RenderResult, Renderer, RendererError};
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};
use kurbo::{Affine, Point, Rect};
use peniko::Color;
use tiny_skia::{
    FillRule, LineCap, LineJoin, Paint, PathBuilder, Stroke as SkiaStroke, StrokeDash, Transform,
};
use tradeboard_core::canvas::CanvasDocument;
use tradeboard_core::selection::element_bounds;
use tradeboard_core::shapes::{Stroke, StrokeTool, TextElement};
use tradeboard_core::storage::RenderSurface;

/// Screen-space gap between an element and its selection outline.
const SELECTION_PADDING: f64 = 4.0;

/// A rendered frame.
///
/// Painting happens on a premultiplied buffer; a straight-alpha copy is kept
/// for consumers such as thumbnail capture.
pub struct Pixmap {
    inner: tiny_skia::Pixmap,
    rgba: Vec<u8>,
}

impl Pixmap {
    /// Allocate a transparent pixmap.
    pub fn new(width: u32, height: u32) -> RenderResult<Self> {
        let inner = tiny_skia::Pixmap::new(width, height).ok_or_else(|| {
            RendererError::InvalidSurface(format!("cannot allocate {}x{} pixmap", width, height))
        })?;
        let mut pixmap = Self { inner, rgba: Vec::new() };
        pixmap.sync();
        Ok(pixmap)
    }

    /// Straight-alpha RGBA of the pixel at (x, y).
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.inner.width() || y >= self.inner.height() {
            return None;
        }
        let i = (y as usize * self.inner.width() as usize + x as usize) * 4;
        self.rgba.get(i..i + 4).and_then(|p| p.try_into().ok())
    }

    /// Encode as PNG.
    pub fn encode_png(&self) -> RenderResult<Vec<u8>> {
        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes)
            .write_image(
                &self.rgba,
                self.inner.width(),
                self.inner.height(),
                ExtendedColorType::Rgba8,
            )
            .map_err(|e| RendererError::RenderFailed(format!("PNG encoding failed: {}", e)))?;
        Ok(bytes)
    }

    /// Refresh the straight-alpha copy after painting.
    fn sync(&mut self) {
        self.rgba.clear();
        self.rgba.extend(self.inner.pixels().iter().flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        }));
    }
}

impl RenderSurface for Pixmap {
    fn width(&self) -> u32 {
        self.inner.width()
    }

    fn height(&self) -> u32 {
        self.inner.height()
    }

    fn rgba(&self) -> &[u8] {
        &self.rgba
    }
}

/// CPU renderer. Keeps its target between frames and reallocates only when
/// the viewport size changes.
#[derive(Default)]
pub struct PixmapRenderer {
    target: Option<Pixmap>,
}

impl PixmapRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last rendered frame.
    pub fn surface(&self) -> Option<&Pixmap> {
        self.target.as_ref()
    }

    /// Take ownership of the last rendered frame.
    pub fn take_surface(&mut self) -> Option<Pixmap> {
        self.target.take()
    }

    /// Render a frame and return it.
    pub fn render(&mut self, ctx: &RenderContext) -> RenderResult<&Pixmap> {
        self.build_scene(ctx)?;
        self.target
            .as_ref()
            .ok_or_else(|| RendererError::RenderFailed("no frame was produced".to_string()))
    }

    fn target_for(&mut self, width: u32, height: u32) -> RenderResult<&mut Pixmap> {
        let reuse = self
            .target
            .as_ref()
            .is_some_and(|p| p.width() == width && p.height() == height);
        if !reuse {
            self.target = Some(Pixmap::new(width, height)?);
        }
        self.target
            .as_mut()
            .ok_or_else(|| RendererError::InvalidSurface("render target missing".to_string()))
    }
}

impl Renderer for PixmapRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) -> RenderResult<()> {
        let size = ctx.viewport_size;
        let finite = size.width.is_finite() && size.height.is_finite();
        if !finite || size.width < 1.0 || size.height < 1.0 {
            return Err(RendererError::InvalidSurface(format!(
                "viewport {}x{} has no area",
                size.width, size.height
            )));
        }
        let background = self.background_color(ctx);
        let target = self.target_for(size.width.ceil() as u32, size.height.ceil() as u32)?;
        let pixmap = &mut target.inner;
        pixmap.fill(to_skia(background));

        let camera = ctx.canvas.camera.transform();
        let transform = skia_transform(camera);
        draw_document(pixmap, ctx.canvas.document(), transform, background);

        if let Some(preview) = ctx.canvas.preview_stroke() {
            draw_stroke(pixmap, preview, transform, background);
        }

        if !ctx.hide_ui {
            let document = ctx.canvas.document();
            for item in ctx.canvas.selection().items() {
                if let Some(bounds) = element_bounds(document, item) {
                    let screen = camera
                        .transform_rect_bbox(bounds)
                        .inflate(SELECTION_PADDING, SELECTION_PADDING);
                    outline_rect(pixmap, screen, ctx.selection_color, false);
                }
            }
            if let Some(text) = ctx.canvas.editing_text().and_then(|id| document.text(id)) {
                let screen = camera.transform_rect_bbox(text.text_bounds().rect());
                outline_rect(pixmap, screen, ctx.selection_color, true);
            }
            if let Some(marquee) = ctx.selection_rect {
                let screen = camera.transform_rect_bbox(marquee);
                let fill = with_alpha(ctx.selection_color, 40);
                fill_rect(pixmap, screen, fill, Transform::identity());
                outline_rect(pixmap, screen, ctx.selection_color, false);
            }
        }

        target.sync();
        Ok(())
    }
}

fn skia_transform(affine: Affine) -> Transform {
    let [a, b, c, d, e, f] = affine.as_coeffs();
    Transform::from_row(a as f32, b as f32, c as f32, d as f32, e as f32, f as f32)
}

fn paint_for(color: Color) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_skia(color));
    paint.anti_alias = true;
    paint
}

/// Paint strokes and text elements in z-order.
fn draw_document(
    pixmap: &mut tiny_skia::Pixmap,
    document: &CanvasDocument,
    transform: Transform,
    background: Color,
) {
    for stroke in &document.strokes {
        draw_stroke(pixmap, stroke, transform, background);
    }
    for text in &document.texts {
        draw_text(pixmap, text, transform);
    }
}

fn draw_stroke(
    pixmap: &mut tiny_skia::Pixmap,
    stroke: &Stroke,
    transform: Transform,
    background: Color,
) {
    let color = match stroke.tool {
        StrokeTool::Pen => parse_color(&stroke.color),
        StrokeTool::Eraser => background,
    };
    let paint = paint_for(color);
    let width = stroke.size.max(0.0) as f32;

    match stroke.points.as_slice() {
        [] => {}
        [dot] => {
            let radius = (width / 2.0).max(0.5);
            if let Some(path) = PathBuilder::from_circle(dot.x as f32, dot.y as f32, radius) {
                pixmap.fill_path(&path, &paint, FillRule::Winding, transform, None);
            }
        }
        [first, rest @ ..] => {
            let mut pb = PathBuilder::new();
            pb.move_to(first.x as f32, first.y as f32);
            for p in rest {
                pb.line_to(p.x as f32, p.y as f32);
            }
            let Some(path) = pb.finish() else {
                return;
            };
            let style = SkiaStroke {
                width,
                line_cap: LineCap::Round,
                line_join: LineJoin::Round,
                ..Default::default()
            };
            pixmap.stroke_path(&path, &paint, &style, transform, None);
        }
    }
}

/// Text is drawn greeked: one filled cell per visible glyph.
fn draw_text(pixmap: &mut tiny_skia::Pixmap, text: &TextElement, transform: Transform) {
    let color = parse_color(text.color());
    for cell in text.glyph_boxes() {
        fill_rect(pixmap, cell, color, transform);
    }
}

fn fill_rect(pixmap: &mut tiny_skia::Pixmap, rect: Rect, color: Color, transform: Transform) {
    let (x0, y0, x1, y1) = (rect.x0 as f32, rect.y0 as f32, rect.x1 as f32, rect.y1 as f32);
    let Some(rect) = tiny_skia::Rect::from_ltrb(x0, y0, x1, y1) else {
        return;
    };
    pixmap.fill_rect(rect, &paint_for(color), transform, None);
}

/// One-pixel outline in screen space.
fn outline_rect(pixmap: &mut tiny_skia::Pixmap, rect: Rect, color: Color, dashed: bool) {
    let mut pb = PathBuilder::new();
    let corners = [
        Point::new(rect.x0, rect.y0),
        Point::new(rect.x1, rect.y0),
        Point::new(rect.x1, rect.y1),
        Point::new(rect.x0, rect.y1),
    ];
    pb.move_to(corners[0].x as f32, corners[0].y as f32);
    for corner in &corners[1..] {
        pb.line_to(corner.x as f32, corner.y as f32);
    }
    pb.close();
    let Some(path) = pb.finish() else {
        return;
    };
    let style = SkiaStroke {
        width: 1.0,
        dash: if dashed { StrokeDash::new(vec![4.0, 3.0], 0.0) } else { None },
        ..Default::default()
    };
    pixmap.stroke_path(&path, &paint_for(color), &style, Transform::identity(), None);
}
