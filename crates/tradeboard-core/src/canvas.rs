//! Canvas session: the live document and everything that mutates it.

use crate::camera::Camera;
use crate::config::EngineConfig;
use crate::history::{History, HistoryState};
use crate::selection::{self, Selection, SelectionBounds};
use crate::shapes::{Element, ElementRef, RunStyle, Stroke, StrokeTool, TextElement, TextUpdate};
use crate::storage::{CanvasData, CanvasPatch};
use crate::tools::{ToolKind, ToolManager, ToolStyle};
use kurbo::{Point, Rect, Size, Vec2};

/// Padding around content when fitting the view, in screen pixels.
const FIT_PADDING: f64 = 40.0;

/// The drawable content of a canvas: strokes and text annotations in z-order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasDocument {
    pub strokes: Vec<Stroke>,
    pub texts: Vec<TextElement>,
}

impl CanvasDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.strokes.is_empty() && self.texts.is_empty()
    }

    pub fn text(&self, id: &str) -> Option<&TextElement> {
        self.texts.iter().find(|text| text.id == id)
    }

    pub fn text_mut(&mut self, id: &str) -> Option<&mut TextElement> {
        self.texts.iter_mut().find(|text| text.id == id)
    }

    pub fn text_index(&self, id: &str) -> Option<usize> {
        self.texts.iter().position(|text| text.id == id)
    }

    /// Whether the content equals a history snapshot.
    pub fn matches(&self, state: &HistoryState) -> bool {
        self.strokes == state.strokes && self.texts == state.texts
    }

    /// Deep copy for the history.
    pub fn snapshot(&self) -> HistoryState {
        HistoryState::new(self.strokes.clone(), self.texts.clone())
    }

    /// Replace the content with a history snapshot.
    pub fn restore(&mut self, state: HistoryState) {
        self.strokes = state.strokes;
        self.texts = state.texts;
    }

    /// Bounding box of all content.
    pub fn bounds(&self) -> Option<Rect> {
        self.strokes
            .iter()
            .filter(|stroke| !stroke.is_empty())
            .map(Element::bounds)
            .chain(self.texts.iter().map(Element::bounds))
            .reduce(|a, b| a.union(b))
    }
}

/// Caret movement within the text being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaretMove {
    Left,
    Right,
    /// Start of the current line.
    Home,
    /// End of the current line.
    End,
}

/// Text element currently open for editing.
#[derive(Debug, Clone)]
struct TextEdit {
    id: String,
    /// Caret position as a character index.
    caret: usize,
    /// Created by this session (rather than opened).
    created: bool,
    /// Document before the session. Recorded when the session ends, and only
    /// if the session changed the document.
    before: HistoryState,
}

/// Selection drag in progress.
#[derive(Debug, Clone)]
struct MoveDrag {
    /// Document before the drag; `None` once the first move recorded it.
    before: Option<HistoryState>,
}

/// One editing session over a canvas.
///
/// Owns the live document, the viewport camera, the tool state, the selection
/// and the history. Every committing operation records a snapshot of the
/// document before it mutates and bumps [`Canvas::revision`].
#[derive(Debug, Clone)]
pub struct Canvas {
    document: CanvasDocument,
    /// View camera.
    pub camera: Camera,
    tool_manager: ToolManager,
    selection: Selection,
    history: History,
    editing: Option<TextEdit>,
    drag: Option<MoveDrag>,
    config: EngineConfig,
    revision: u64,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Canvas {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            document: CanvasDocument::new(),
            camera: Camera::with_limits(config.min_scale, config.max_scale),
            tool_manager: ToolManager::new(&config),
            selection: Selection::new(),
            history: History::with_limit(config.history_limit),
            editing: None,
            drag: None,
            config,
            revision: 0,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &CanvasDocument {
        &self.document
    }

    pub fn strokes(&self) -> &[Stroke] {
        &self.document.strokes
    }

    pub fn texts(&self) -> &[TextElement] {
        &self.document.texts
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Monotonic change counter, bumped by every committing operation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn commit(&mut self) {
        self.revision += 1;
    }

    /// Screen point to canvas point.
    pub fn to_canvas(&self, screen: Point) -> Point {
        self.camera.to_canvas(screen)
    }

    /// Hit tolerance converted to canvas units at the current zoom.
    pub fn hit_tolerance(&self) -> f64 {
        self.config.hit_tolerance / self.camera.scale
    }

    // --- Tools ---

    pub fn tool(&self) -> ToolKind {
        self.tool_manager.current_tool
    }

    /// Switch tools. Leaving the text tool ends the active edit.
    pub fn set_tool(&mut self, tool: ToolKind) {
        if tool != ToolKind::Text {
            self.finish_text_editing();
        }
        self.end_move();
        let previous = self.tool_manager.set_tool(tool);
        if previous != tool {
            log::debug!("Tool {:?} -> {:?}", previous, tool);
        }
    }

    pub fn style(&self) -> &ToolStyle {
        &self.tool_manager.style
    }

    pub fn style_mut(&mut self) -> &mut ToolStyle {
        &mut self.tool_manager.style
    }

    // --- Strokes ---

    /// Open a pen stroke at a canvas point.
    pub fn begin_stroke(&mut self, point: Point) {
        self.finish_text_editing();
        self.tool_manager.begin_stroke(point, StrokeTool::Pen);
    }

    pub fn extend_stroke(&mut self, point: Point) -> bool {
        self.tool_manager.extend_stroke(point)
    }

    /// Finalize the in-progress stroke. Returns false if it was discarded.
    pub fn commit_stroke(&mut self) -> bool {
        let Some(stroke) = self.tool_manager.finish_stroke() else {
            return false;
        };
        self.history.record(self.document.snapshot());
        log::debug!("Committed stroke with {} points", stroke.len());
        self.document.strokes.push(stroke);
        self.commit();
        true
    }

    pub fn preview_stroke(&self) -> Option<&Stroke> {
        self.tool_manager.preview()
    }

    // --- Eraser ---

    /// Start an eraser gesture and erase under the first sample.
    pub fn begin_erase(&mut self, point: Point) -> usize {
        self.finish_text_editing();
        self.tool_manager.begin_erase();
        self.erase_to(point)
    }

    /// Move the eraser footprint, removing every stroke it touches.
    /// The first removal of a gesture records one snapshot.
    pub fn erase_to(&mut self, point: Point) -> usize {
        let Some(gesture) = self.tool_manager.eraser_mut() else {
            return 0;
        };
        let hits = gesture.sweep(point, &self.document.strokes);
        if hits.is_empty() {
            return 0;
        }
        if !gesture.has_recorded() {
            gesture.mark_recorded();
            self.history.record(self.document.snapshot());
        }
        for index in hits.iter().rev() {
            self.document.strokes.remove(*index);
        }
        // Stroke references are positional
        self.selection.clear();
        log::debug!("Eraser removed {} stroke(s)", hits.len());
        self.commit();
        hits.len()
    }

    pub fn end_erase(&mut self) {
        self.tool_manager.finish_erase();
    }

    // --- Text ---

    /// Id of the text element being edited.
    pub fn editing_text(&self) -> Option<&str> {
        self.editing.as_ref().map(|edit| edit.id.as_str())
    }

    /// Caret of the active edit, as a character index.
    pub fn caret(&self) -> Option<usize> {
        self.editing.as_ref().map(|edit| edit.caret)
    }

    /// Create an empty text element at a canvas point and start editing it.
    pub fn create_text(&mut self, point: Point) -> String {
        self.finish_text_editing();
        let before = self.document.snapshot();
        let id = uuid::Uuid::new_v4().to_string();
        let style = &self.tool_manager.style;
        let text = TextElement::new(id.clone(), point, style.color.clone(), style.font_size);
        self.document.texts.push(text);
        self.selection.select(ElementRef::Text(id.clone()));
        self.editing = Some(TextEdit {
            id: id.clone(),
            caret: 0,
            created: true,
            before,
        });
        id
    }

    /// Open an existing text element for editing, caret at the end.
    pub fn open_text(&mut self, id: &str) -> bool {
        if self.editing_text() == Some(id) {
            return true;
        }
        self.finish_text_editing();
        let Some(text) = self.document.text(id) else {
            return false;
        };
        let caret = text.char_count();
        self.selection.select(ElementRef::Text(id.to_string()));
        self.editing = Some(TextEdit {
            id: id.to_string(),
            caret,
            created: false,
            before: self.document.snapshot(),
        });
        true
    }

    /// Text-tool click: open the text element under the point, or create one.
    pub fn open_or_create_text(&mut self, point: Point) -> String {
        if let Some(ElementRef::Text(id)) = self.hit_test(point) {
            if self.open_text(&id) {
                return id;
            }
        }
        self.create_text(point)
    }

    /// Record history for a change to text `id`. Changes to the element being
    /// edited coalesce into the session's single entry, recorded when it ends.
    fn record_text_change(&mut self, id: &str) {
        if self.editing_text() != Some(id) {
            self.finish_text_editing();
            self.history.record(self.document.snapshot());
        }
    }

    fn active_edit(&self) -> Option<(String, usize)> {
        self.editing.as_ref().map(|edit| (edit.id.clone(), edit.caret))
    }

    fn set_caret(&mut self, caret: usize) {
        if let Some(edit) = self.editing.as_mut() {
            edit.caret = caret;
        }
    }

    /// Insert text at the caret.
    pub fn insert_text(&mut self, insert: &str) -> bool {
        let Some((id, caret)) = self.active_edit() else {
            return false;
        };
        if insert.is_empty() || self.document.text(&id).is_none() {
            return false;
        }
        self.record_text_change(&id);
        if let Some(text) = self.document.text_mut(&id) {
            text.insert_text(caret, insert);
        }
        self.set_caret(caret + insert.chars().count());
        self.commit();
        true
    }

    /// Delete the character before the caret.
    pub fn backspace(&mut self) -> bool {
        match self.active_edit() {
            Some((id, caret)) if caret > 0 => {
                let removed = self.delete_text_range(&id, caret - 1, caret);
                if removed {
                    self.set_caret(caret - 1);
                }
                removed
            }
            _ => false,
        }
    }

    /// Delete the character after the caret.
    pub fn delete_forward(&mut self) -> bool {
        match self.active_edit() {
            Some((id, caret)) => self.delete_text_range(&id, caret, caret + 1),
            None => false,
        }
    }

    fn delete_text_range(&mut self, id: &str, start: usize, end: usize) -> bool {
        if !self.text_range_valid(id, start, end) {
            return false;
        }
        self.record_text_change(id);
        if let Some(text) = self.document.text_mut(id) {
            text.delete_range(start, end);
        }
        self.commit();
        true
    }

    fn text_range_valid(&self, id: &str, start: usize, end: usize) -> bool {
        self.document
            .text(id)
            .is_some_and(|text| start < end.min(text.char_count()))
    }

    pub fn move_caret(&mut self, movement: CaretMove) {
        let Some((id, caret)) = self.active_edit() else {
            return;
        };
        let Some(text) = self.document.text(&id) else {
            return;
        };
        let chars: Vec<char> = text.text().chars().collect();
        let caret = caret.min(chars.len());
        let target = match movement {
            CaretMove::Left => caret.saturating_sub(1),
            CaretMove::Right => (caret + 1).min(chars.len()),
            CaretMove::Home => chars[..caret]
                .iter()
                .rposition(|c| *c == '\n')
                .map(|i| i + 1)
                .unwrap_or(0),
            CaretMove::End => chars[caret..]
                .iter()
                .position(|c| *c == '\n')
                .map(|i| caret + i)
                .unwrap_or(chars.len()),
        };
        self.set_caret(target);
    }

    /// Style the characters `[start, end)` of a text element.
    pub fn apply_text_style(
        &mut self,
        id: &str,
        start: usize,
        end: usize,
        style: RunStyle,
    ) -> bool {
        if !self.text_range_valid(id, start, end) {
            return false;
        }
        self.record_text_change(id);
        if let Some(text) = self.document.text_mut(id) {
            text.apply_style(start, end, style);
        }
        self.commit();
        true
    }

    /// Replace a text element's content with plain text.
    pub fn replace_text(&mut self, id: &str, content: &str) -> bool {
        if self.document.text(id).is_none_or(|text| text.text() == content) {
            return false;
        }
        self.record_text_change(id);
        if let Some(text) = self.document.text_mut(id) {
            text.set_plain_text(content);
        }
        if let Some(edit) = self.editing.as_mut().filter(|edit| edit.id == id) {
            edit.caret = content.chars().count();
        }
        self.commit();
        true
    }

    /// Merge a partial update into a text element.
    pub fn update_text(&mut self, id: &str, update: TextUpdate) -> bool {
        if self.document.text(id).is_none() {
            return false;
        }
        self.record_text_change(id);
        if let Some(text) = self.document.text_mut(id) {
            text.apply_update(update);
            let len = text.char_count();
            if let Some(edit) = self.editing.as_mut().filter(|edit| edit.id == id) {
                edit.caret = edit.caret.min(len);
            }
        }
        self.commit();
        true
    }

    /// End the active edit. An empty element is discarded. The session leaves
    /// one history entry, or none if the document ends up unchanged.
    ///
    /// Returns true if the element was kept.
    pub fn finish_text_editing(&mut self) -> bool {
        let Some(edit) = self.editing.take() else {
            return false;
        };
        let kept = match self.document.text_index(&edit.id) {
            Some(index) if self.document.texts[index].is_empty() => {
                self.document.texts.remove(index);
                self.selection.remove(&ElementRef::Text(edit.id.clone()));
                log::debug!("Discarded empty text element {}", edit.id);
                self.commit();
                false
            }
            Some(_) => true,
            None => false,
        };
        if !self.document.matches(&edit.before) {
            self.history.record(edit.before);
        }
        kept
    }

    /// Remove a text element.
    pub fn delete_text(&mut self, id: &str) -> bool {
        if self.document.text(id).is_none() {
            return false;
        }
        self.finish_text_editing();
        // Finishing the edit discards the element if it is empty
        let Some(index) = self.document.text_index(id) else {
            return true;
        };
        self.history.record(self.document.snapshot());
        self.document.texts.remove(index);
        self.selection.remove(&ElementRef::Text(id.to_string()));
        self.commit();
        true
    }

    // --- Selection ---

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn hit_test(&self, point: Point) -> Option<ElementRef> {
        selection::hit_test(&self.document, point, self.hit_tolerance())
    }

    /// Select the element under a canvas point. With `toggle`, flip its
    /// membership instead of replacing the selection.
    pub fn select_at(&mut self, point: Point, toggle: bool) -> Option<ElementRef> {
        let hit = self.hit_test(point);
        match (&hit, toggle) {
            (Some(item), true) => self.selection.toggle(item.clone()),
            (Some(item), false) => self.selection.select(item.clone()),
            (None, false) => self.selection.clear(),
            (None, true) => {}
        }
        hit
    }

    /// Select every element whose bounds intersect the rectangle.
    pub fn select_range(&mut self, rect: Rect, additive: bool) -> usize {
        let hits = selection::select_range(&self.document, rect);
        let count = hits.len();
        if additive {
            for hit in hits {
                self.selection.add(hit);
            }
        } else {
            self.selection.set(hits);
        }
        count
    }

    pub fn select_all(&mut self) {
        let strokes = (0..self.document.strokes.len()).map(ElementRef::Stroke);
        let texts = self.document.texts.iter().map(|text| ElementRef::Text(text.id.clone()));
        let all: Vec<_> = strokes.chain(texts).collect();
        self.selection.set(all);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn selection_bounds(&self) -> Option<SelectionBounds> {
        selection::aggregate_bounds(&self.document, &self.selection)
    }

    /// Start dragging the selection. The drag records one snapshot, on its first move.
    pub fn begin_move(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.finish_text_editing();
        if self.drag.is_none() {
            self.drag = Some(MoveDrag {
                before: Some(self.document.snapshot()),
            });
        }
        true
    }

    /// Move every selected element by a canvas delta.
    pub fn move_selection(&mut self, delta: Vec2) {
        if delta == Vec2::ZERO || !self.begin_move() {
            return;
        }
        if let Some(before) = self.drag.as_mut().and_then(|drag| drag.before.take()) {
            self.history.record(before);
        }
        let items = self.selection.items().to_vec();
        selection::move_elements(&mut self.document, &items, delta);
        self.commit();
    }

    /// Finish a drag. A drag that never moved leaves no history entry.
    pub fn end_move(&mut self) {
        self.drag = None;
    }

    pub fn is_moving(&self) -> bool {
        self.drag.is_some()
    }

    /// Remove every selected element as one undoable step.
    pub fn delete_selection(&mut self) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        self.end_move();
        // An empty element being edited is discarded here, not recorded
        let text_count = self.document.texts.len();
        self.finish_text_editing();
        let discarded = self.document.texts.len() < text_count;

        let mut stroke_indices = Vec::new();
        let mut text_ids = Vec::new();
        for item in self.selection.items() {
            match item {
                ElementRef::Stroke(index) if *index < self.document.strokes.len() => {
                    stroke_indices.push(*index)
                }
                ElementRef::Text(id) if self.document.text(id).is_some() => {
                    text_ids.push(id.clone())
                }
                _ => {}
            }
        }
        self.selection.clear();
        if stroke_indices.is_empty() && text_ids.is_empty() {
            return discarded;
        }

        self.history.record(self.document.snapshot());
        stroke_indices.sort_unstable();
        for index in stroke_indices.iter().rev() {
            self.document.strokes.remove(*index);
        }
        self.document.texts.retain(|text| !text_ids.contains(&text.id));
        log::debug!("Deleted {} stroke(s) and {} text(s)", stroke_indices.len(), text_ids.len());
        self.commit();
        true
    }

    /// Remove all content as one undoable step.
    pub fn clear(&mut self) -> bool {
        self.finish_text_editing();
        self.end_move();
        self.tool_manager.cancel();
        if self.document.is_empty() {
            return false;
        }
        self.history.record(self.document.snapshot());
        self.document = CanvasDocument::new();
        self.selection.clear();
        self.commit();
        true
    }

    // --- History ---

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.settle();
        match self.history.undo(self.document.snapshot()) {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.settle();
        match self.history.redo(self.document.snapshot()) {
            Some(state) => {
                self.restore(state);
                true
            }
            None => false,
        }
    }

    /// Close any open gesture or edit before a history jump.
    fn settle(&mut self) {
        self.finish_text_editing();
        self.end_move();
        self.tool_manager.cancel();
    }

    fn restore(&mut self, state: HistoryState) {
        self.document.restore(state);
        self.selection.clear();
        self.commit();
    }

    // --- View ---

    /// Fit the camera to the content, or reset it when the canvas is empty.
    pub fn fit_to_content(&mut self, viewport: Size) {
        match self.document.bounds() {
            Some(bounds) => self.camera.fit_to_bounds(bounds, viewport, FIT_PADDING),
            None => self.camera.reset(),
        }
    }

    // --- Persistence ---

    /// Replace the session with persisted data. History and selection start empty.
    pub fn load(&mut self, data: &CanvasData) {
        self.editing = None;
        self.drag = None;
        self.tool_manager.cancel();
        self.document = CanvasDocument {
            strokes: data.strokes.clone(),
            texts: data.texts.clone(),
        };
        self.camera.set_state(data.transform);
        self.history.clear();
        self.selection.clear();
        self.commit();
    }

    /// Current (strokes, texts, transform) as a storage patch.
    ///
    /// A text element still being created with no content is left out.
    pub fn to_patch(&self) -> CanvasPatch {
        let pending = self
            .editing
            .as_ref()
            .filter(|edit| edit.created)
            .map(|edit| edit.id.as_str());
        let texts = self
            .document
            .texts
            .iter()
            .filter(|text| !(Some(text.id.as_str()) == pending && text.is_empty()))
            .cloned()
            .collect();
        CanvasPatch {
            strokes: Some(self.document.strokes.clone()),
            texts: Some(texts),
            transform: Some(self.camera.state()),
            ..CanvasPatch::default()
        }
    }
}
