//! Rich-text annotation element.
//!
//! A [`TextElement`] stores its content as an ordered list of styled
//! [`TextRun`]s. The plain `text` field is a cached projection of the runs:
//! every mutation goes through [`TextElement::sync_text`], so
//! `concat(runs[].text) == text` holds after every edit, including elements
//! decoded from storage.

use super::Element;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

/// Line height as a multiple of the font size.
const LINE_HEIGHT: f64 = 1.2;
/// Minimum content width so empty elements stay clickable.
const MIN_CONTENT_WIDTH: f64 = 20.0;
/// Horizontal advance multiplier applied to bold glyphs.
const BOLD_WIDTH_FACTOR: f64 = 1.08;

/// A styled span of a text element's content.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
}

impl TextRun {
    /// Create an unstyled run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create a run with the given style.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        let mut run = Self::plain(text);
        style.apply_to(&mut run);
        run
    }

    pub fn is_bold(&self) -> bool {
        self.bold.unwrap_or(false)
    }

    pub fn is_italic(&self) -> bool {
        self.italic.unwrap_or(false)
    }

    pub fn is_strikethrough(&self) -> bool {
        self.strikethrough.unwrap_or(false)
    }

    /// Style flags of this run.
    pub fn style(&self) -> RunStyle {
        RunStyle {
            bold: self.bold,
            italic: self.italic,
            strikethrough: self.strikethrough,
        }
    }

    fn same_style(&self, other: &TextRun) -> bool {
        self.is_bold() == other.is_bold()
            && self.is_italic() == other.is_italic()
            && self.is_strikethrough() == other.is_strikethrough()
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Copy of this run's style holding different text.
    fn with_text(&self, text: String) -> Self {
        Self {
            text,
            ..self.clone()
        }
    }
}

/// Style patch for runs. `None` leaves the flag unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bold: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikethrough: Option<bool>,
}

impl RunStyle {
    pub fn bold(on: bool) -> Self {
        Self {
            bold: Some(on),
            ..Self::default()
        }
    }

    pub fn italic(on: bool) -> Self {
        Self {
            italic: Some(on),
            ..Self::default()
        }
    }

    pub fn strikethrough(on: bool) -> Self {
        Self {
            strikethrough: Some(on),
            ..Self::default()
        }
    }

    /// Apply the set flags of this patch to a run.
    pub fn apply_to(&self, run: &mut TextRun) {
        if let Some(bold) = self.bold {
            run.bold = Some(bold);
        }
        if let Some(italic) = self.italic {
            run.italic = Some(italic);
        }
        if let Some(strikethrough) = self.strikethrough {
            run.strikethrough = Some(strikethrough);
        }
    }
}

/// List decoration of a text element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListType {
    #[default]
    #[serde(rename = "none")]
    Plain,
    Bullet,
    Number,
}

/// Partial update for a text element. Only `Some` fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextUpdate {
    pub color: Option<String>,
    pub font_size: Option<f64>,
    pub font_family: Option<String>,
    pub font_weight: Option<String>,
    pub font_style: Option<String>,
    pub text_decoration: Option<String>,
    pub link: Option<String>,
    pub list_type: Option<ListType>,
    pub runs: Option<Vec<TextRun>>,
}

/// Layout box of a text element, derived from font metrics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextBounds {
    /// Left edge of the padded box.
    pub x: f64,
    /// Top edge of the padded box.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub content_width: f64,
    pub content_height: f64,
    pub padding: f64,
}

impl TextBounds {
    /// Padding added around the text content.
    pub const DEFAULT_PADDING: f64 = 4.0;

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x <= self.x + self.width
            && point.y >= self.y
            && point.y <= self.y + self.height
    }
}

/// One laid-out line: its width and the (x, advance) cell of every glyph.
struct LineLayout {
    width: f64,
    cells: Vec<(char, f64, f64)>,
}

/// A rich-text annotation.
#[derive(Debug, Serialize, Deserialize)]
#[serde(from = "TextElementRecord", into = "TextElementRecord")]
pub struct TextElement {
    /// Unique identifier.
    pub id: String,
    /// Top-left corner of the content, canvas coordinates.
    pub x: f64,
    pub y: f64,
    text: String,
    runs: Vec<TextRun>,
    color: String,
    font_size: f64,
    font_family: Option<String>,
    font_weight: Option<String>,
    font_style: Option<String>,
    text_decoration: Option<String>,
    link: Option<String>,
    list_type: Option<ListType>,
    /// Content size (width, height) computed on first access after a mutation.
    /// Position is not part of the cache, so moving never invalidates it.
    content_size: RwLock<Option<(f64, f64)>>,
}

impl Clone for TextElement {
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            x: self.x,
            y: self.y,
            text: self.text.clone(),
            runs: self.runs.clone(),
            color: self.color.clone(),
            font_size: self.font_size,
            font_family: self.font_family.clone(),
            font_weight: self.font_weight.clone(),
            font_style: self.font_style.clone(),
            text_decoration: self.text_decoration.clone(),
            link: self.link.clone(),
            list_type: self.list_type,
            // Clone the cached value, not the lock
            content_size: RwLock::new(self.content_size.read().ok().and_then(|guard| *guard)),
        }
    }
}

impl PartialEq for TextElement {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.x == other.x
            && self.y == other.y
            && self.text == other.text
            && self.runs == other.runs
            && self.color == other.color
            && self.font_size == other.font_size
            && self.font_family == other.font_family
            && self.font_weight == other.font_weight
            && self.font_style == other.font_style
            && self.text_decoration == other.text_decoration
            && self.link == other.link
            && self.list_type == other.list_type
    }
}

impl TextElement {
    /// Default font size.
    pub const DEFAULT_FONT_SIZE: f64 = 20.0;

    /// Create an empty element with a single empty run.
    pub fn new(
        id: impl Into<String>,
        position: Point,
        color: impl Into<String>,
        font_size: f64,
    ) -> Self {
        Self {
            id: id.into(),
            x: position.x,
            y: position.y,
            text: String::new(),
            runs: vec![TextRun::default()],
            color: color.into(),
            font_size,
            font_family: None,
            font_weight: None,
            font_style: None,
            text_decoration: None,
            link: None,
            list_type: None,
            content_size: RwLock::new(None),
        }
    }

    /// Create an element holding plain text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_plain_text(text);
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Plain text, always equal to the concatenation of the runs.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn runs(&self) -> &[TextRun] {
        &self.runs
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn font_size(&self) -> f64 {
        self.font_size
    }

    pub fn font_family(&self) -> Option<&str> {
        self.font_family.as_deref()
    }

    pub fn font_weight(&self) -> Option<&str> {
        self.font_weight.as_deref()
    }

    pub fn font_style(&self) -> Option<&str> {
        self.font_style.as_deref()
    }

    pub fn text_decoration(&self) -> Option<&str> {
        self.text_decoration.as_deref()
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn list_type(&self) -> ListType {
        self.list_type.unwrap_or_default()
    }

    /// Number of characters of plain text.
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Whether the plain text is empty. Whitespace counts as content.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Re-derive the plain text from the runs and drop cached metrics.
    ///
    /// Every mutation of the runs ends here.
    fn sync_text(&mut self) {
        self.text = self.runs.iter().map(|run| run.text.as_str()).collect();
        self.invalidate_cache();
    }

    /// Clear the cached content size (call when layout-affecting properties change).
    fn invalidate_cache(&mut self) {
        if let Ok(cache) = self.content_size.get_mut() {
            *cache = None;
        }
    }

    /// Replace the runs. Empty runs are dropped and equally styled neighbours merged.
    pub fn set_runs(&mut self, runs: Vec<TextRun>) {
        self.runs = normalize_runs(runs);
        self.sync_text();
    }

    /// Replace the content with unstyled-by-position text, keeping the first run's style.
    pub fn set_plain_text(&mut self, text: impl Into<String>) {
        let template = self.runs.first().cloned().unwrap_or_default();
        self.runs = vec![template.with_text(text.into())];
        self.sync_text();
    }

    /// Insert text at a character index. The run ending at the index inherits it.
    pub fn insert_text(&mut self, char_index: usize, insert: &str) {
        if insert.is_empty() {
            return;
        }
        if self.runs.is_empty() {
            self.runs.push(TextRun::default());
        }
        let (run_index, byte_offset) = self.locate(char_index);
        self.runs[run_index].text.insert_str(byte_offset, insert);
        self.sync_text();
    }

    /// Delete characters in `[start, end)`. Returns false if nothing was removed.
    pub fn delete_range(&mut self, start: usize, end: usize) -> bool {
        let end = end.min(self.char_count());
        if start >= end {
            return false;
        }
        let template = self.runs.first().cloned().unwrap_or_default();
        let mut pos = 0;
        for run in &mut self.runs {
            let len = run.char_count();
            let local_start = start.saturating_sub(pos);
            let local_end = end.saturating_sub(pos).min(len);
            if local_start < local_end {
                run.text = run
                    .text
                    .chars()
                    .enumerate()
                    .filter(|(i, _)| *i < local_start || *i >= local_end)
                    .map(|(_, c)| c)
                    .collect();
            }
            pos += len;
        }
        let runs = std::mem::take(&mut self.runs);
        self.runs = normalize_runs(runs);
        if self.text_len_of_runs() == 0 {
            self.runs = vec![template.with_text(String::new())];
        }
        self.sync_text();
        true
    }

    /// Apply a style patch to the characters in `[start, end)`, splitting runs as needed.
    pub fn apply_style(&mut self, start: usize, end: usize, style: RunStyle) -> bool {
        let end = end.min(self.char_count());
        if start >= end {
            return false;
        }
        let mut runs = Vec::with_capacity(self.runs.len() + 2);
        let mut pos = 0;
        for run in &self.runs {
            let len = run.char_count();
            let run_start = pos;
            let run_end = pos + len;
            pos = run_end;

            let cut_a = start.clamp(run_start, run_end) - run_start;
            let cut_b = end.clamp(run_start, run_end) - run_start;
            let a = char_to_byte(&run.text, cut_a);
            let b = char_to_byte(&run.text, cut_b);

            runs.push(run.with_text(run.text[..a].to_string()));
            let mut middle = run.with_text(run.text[a..b].to_string());
            style.apply_to(&mut middle);
            runs.push(middle);
            runs.push(run.with_text(run.text[b..].to_string()));
        }
        self.runs = normalize_runs(runs);
        self.sync_text();
        true
    }

    /// Merge a partial update into this element.
    pub fn apply_update(&mut self, update: TextUpdate) {
        if let Some(color) = update.color {
            self.color = color;
        }
        if let Some(font_size) = update.font_size.filter(|s| s.is_finite() && *s > 0.0) {
            self.font_size = font_size;
        }
        if let Some(font_family) = update.font_family {
            self.font_family = Some(font_family);
        }
        if let Some(font_weight) = update.font_weight {
            self.font_weight = Some(font_weight);
        }
        if let Some(font_style) = update.font_style {
            self.font_style = Some(font_style);
        }
        if let Some(text_decoration) = update.text_decoration {
            self.text_decoration = Some(text_decoration);
        }
        if let Some(link) = update.link {
            self.link = Some(link);
        }
        if let Some(list_type) = update.list_type {
            self.list_type = Some(list_type);
        }
        match update.runs {
            Some(runs) => self.set_runs(runs),
            None => self.invalidate_cache(),
        }
    }

    /// Layout box of the element. Metrics are computed lazily and cached.
    pub fn text_bounds(&self) -> TextBounds {
        let (content_width, content_height) = self.content_size();
        let padding = TextBounds::DEFAULT_PADDING;
        TextBounds {
            x: self.x - padding,
            y: self.y - padding,
            width: content_width + padding * 2.0,
            height: content_height + padding * 2.0,
            content_width,
            content_height,
            padding,
        }
    }

    /// Approximate glyph cells in canvas coordinates (whitespace excluded).
    ///
    /// Used by renderers without a font backend and for thumbnails.
    pub fn glyph_boxes(&self) -> Vec<Rect> {
        let line_height = self.font_size * LINE_HEIGHT;
        let indent = self.list_indent();
        let mut boxes = Vec::new();
        for (i, line) in self.layout().iter().enumerate() {
            let top = self.y + i as f64 * line_height + self.font_size * 0.25;
            for &(ch, cx, advance) in &line.cells {
                if ch.is_whitespace() {
                    continue;
                }
                let x0 = self.x + indent + cx;
                boxes.push(Rect::new(x0, top, x0 + advance * 0.85, top + self.font_size * 0.7));
            }
        }
        boxes
    }

    fn content_size(&self) -> (f64, f64) {
        if let Some(size) = self.content_size.read().ok().and_then(|guard| *guard) {
            return size;
        }
        let lines = self.layout();
        let width = lines.iter().map(|line| line.width).fold(0.0, f64::max) + self.list_indent();
        let size = (
            width.max(MIN_CONTENT_WIDTH),
            lines.len().max(1) as f64 * self.font_size * LINE_HEIGHT,
        );
        if let Ok(mut cache) = self.content_size.write() {
            *cache = Some(size);
        }
        size
    }

    fn layout(&self) -> Vec<LineLayout> {
        let mut lines = vec![LineLayout {
            width: 0.0,
            cells: Vec::new(),
        }];
        for run in &self.runs {
            for ch in run.text.chars() {
                if ch == '\n' {
                    lines.push(LineLayout {
                        width: 0.0,
                        cells: Vec::new(),
                    });
                    continue;
                }
                let advance = self.char_advance(ch, run);
                if let Some(line) = lines.last_mut() {
                    line.cells.push((ch, line.width, advance));
                    line.width += advance;
                }
            }
        }
        lines
    }

    fn char_advance(&self, ch: char, run: &TextRun) -> f64 {
        // Wide scripts occupy a full em
        let mut factor = if ch >= '\u{2E80}' {
            1.0
        } else {
            family_width_factor(self.font_family.as_deref())
        };
        if run.is_bold() || self.has_bold_weight() {
            factor *= BOLD_WIDTH_FACTOR;
        }
        self.font_size * factor
    }

    fn has_bold_weight(&self) -> bool {
        match self.font_weight.as_deref() {
            Some(weight) => {
                weight.eq_ignore_ascii_case("bold")
                    || weight.eq_ignore_ascii_case("bolder")
                    || weight.parse::<u16>().map(|w| w >= 600).unwrap_or(false)
            }
            None => false,
        }
    }

    fn list_indent(&self) -> f64 {
        match self.list_type() {
            ListType::Plain => 0.0,
            ListType::Bullet => self.font_size * 1.5,
            ListType::Number => self.font_size * 2.0,
        }
    }

    /// Map a character index to (run index, byte offset). Boundaries resolve
    /// to the end of the preceding run.
    fn locate(&self, char_index: usize) -> (usize, usize) {
        let mut remaining = char_index;
        for (i, run) in self.runs.iter().enumerate() {
            let len = run.char_count();
            if remaining <= len {
                return (i, char_to_byte(&run.text, remaining));
            }
            remaining -= len;
        }
        let last = self.runs.len().saturating_sub(1);
        (last, self.runs.get(last).map(|r| r.text.len()).unwrap_or(0))
    }

    fn text_len_of_runs(&self) -> usize {
        self.runs.iter().map(|run| run.text.len()).sum()
    }
}

impl Element for TextElement {
    fn bounds(&self) -> Rect {
        self.text_bounds().rect()
    }

    fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.bounds().inflate(tolerance, tolerance).contains(point)
    }

    fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// Average advance per em for a font family name.
fn family_width_factor(family: Option<&str>) -> f64 {
    let Some(family) = family else {
        return 0.55;
    };
    let family = family.to_ascii_lowercase();
    if family.contains("mono") || family.contains("courier") {
        0.6
    } else if family.contains("serif") && !family.contains("sans") {
        0.52
    } else {
        0.55
    }
}

fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map(|(byte, _)| byte)
        .unwrap_or(text.len())
}

/// Drop empty runs and merge equally styled neighbours. Never returns an empty list.
fn normalize_runs(runs: Vec<TextRun>) -> Vec<TextRun> {
    let fallback = runs.first().map(|r| r.with_text(String::new())).unwrap_or_default();
    let mut out: Vec<TextRun> = Vec::with_capacity(runs.len());
    for run in runs.into_iter().filter(|run| !run.text.is_empty()) {
        match out.last_mut() {
            Some(last) if last.same_style(&run) => last.text.push_str(&run.text),
            _ => out.push(run),
        }
    }
    if out.is_empty() {
        out.push(fallback);
    }
    out
}

fn default_color() -> String {
    "#000000".to_string()
}

fn default_font_size() -> f64 {
    TextElement::DEFAULT_FONT_SIZE
}

/// Wire representation of a text element.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextElementRecord {
    id: String,
    x: f64,
    y: f64,
    #[serde(default)]
    text: String,
    #[serde(default)]
    runs: Vec<TextRun>,
    #[serde(default = "default_color")]
    color: String,
    #[serde(default = "default_font_size")]
    font_size: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_weight: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    font_style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text_decoration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    list_type: Option<ListType>,
}

impl From<TextElementRecord> for TextElement {
    fn from(record: TextElementRecord) -> Self {
        // Plain-text-only records get a single run; otherwise runs are authoritative.
        let runs = if record.runs.is_empty() {
            vec![TextRun::plain(record.text.clone())]
        } else {
            record.runs
        };
        let mut element = Self {
            id: record.id,
            x: record.x,
            y: record.y,
            text: String::new(),
            runs,
            color: record.color,
            font_size: record.font_size,
            font_family: record.font_family,
            font_weight: record.font_weight,
            font_style: record.font_style,
            text_decoration: record.text_decoration,
            link: record.link,
            list_type: record.list_type,
            content_size: RwLock::new(None),
        };
        element.sync_text();
        if element.text != record.text {
            log::debug!("Text element {} had stale plain text; re-derived from runs", element.id);
        }
        element
    }
}

impl From<TextElement> for TextElementRecord {
    fn from(element: TextElement) -> Self {
        Self {
            id: element.id,
            x: element.x,
            y: element.y,
            text: element.text,
            runs: element.runs,
            color: element.color,
            font_size: element.font_size,
            font_family: element.font_family,
            font_weight: element.font_weight,
            font_style: element.font_style,
            text_decoration: element.text_decoration,
            link: element.link,
            list_type: element.list_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(text: &str) -> TextElement {
        TextElement::new("t1", Point::new(100.0, 100.0), "#000000", 20.0).with_text(text)
    }

    fn assert_synced(element: &TextElement) {
        let joined: String = element.runs().iter().map(|r| r.text.as_str()).collect();
        assert_eq!(joined, element.text());
    }

    #[test]
    fn test_text_creation() {
        let text = TextElement::new("a", Point::ZERO, "#111111", TextElement::DEFAULT_FONT_SIZE);
        assert_eq!(text.text(), "");
        assert_eq!(text.runs().len(), 1);
        assert!(text.is_empty());
    }

    #[test]
    fn test_insert_and_delete_keep_runs_in_sync() {
        let mut text = element("Hello");
        text.insert_text(5, " world");
        assert_eq!(text.text(), "Hello world");
        assert_synced(&text);

        assert!(text.delete_range(0, 6));
        assert_eq!(text.text(), "world");
        assert_synced(&text);

        assert!(!text.delete_range(3, 3));
        assert!(text.delete_range(0, 100));
        assert_eq!(text.text(), "");
        assert_eq!(text.runs().len(), 1);
    }

    #[test]
    fn test_apply_style_splits_and_merges_runs() {
        let mut text = element("Hello world");
        assert!(text.apply_style(6, 11, RunStyle::bold(true)));
        assert_eq!(text.runs().len(), 2);
        assert_eq!(text.runs()[0].text, "Hello ");
        assert_eq!(text.runs()[1].text, "world");
        assert!(text.runs()[1].is_bold());
        assert_synced(&text);

        // Un-bolding merges the runs back together.
        text.apply_style(0, 11, RunStyle::bold(false));
        assert_eq!(text.runs().len(), 1);
        assert_eq!(text.text(), "Hello world");
    }

    #[test]
    fn test_insert_at_boundary_extends_preceding_run() {
        let mut text = element("ab");
        text.apply_style(1, 2, RunStyle::italic(true));
        text.insert_text(1, "X");
        assert_eq!(text.runs()[0].text, "aX");
        assert_eq!(text.runs()[1].text, "b");
        assert_synced(&text);
    }

    #[test]
    fn test_multibyte_editing() {
        let mut text = element("héllo");
        text.apply_style(1, 3, RunStyle::strikethrough(true));
        assert_eq!(text.runs()[1].text, "él");
        text.delete_range(1, 2);
        assert_eq!(text.text(), "hllo");
        assert_synced(&text);
    }

    #[test]
    fn test_update_merges_only_provided_fields() {
        let mut text = element("Note");
        text.apply_update(TextUpdate {
            font_family: Some("Inter".into()),
            link: Some("https://example.com".into()),
            ..TextUpdate::default()
        });
        text.apply_update(TextUpdate {
            color: Some("#ff0000".into()),
            ..TextUpdate::default()
        });
        assert_eq!(text.color(), "#ff0000");
        assert_eq!(text.font_family(), Some("Inter"));
        assert_eq!(text.link(), Some("https://example.com"));
        assert!((text.font_size() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_update_runs_rederives_text() {
        let mut text = element("old");
        text.apply_update(TextUpdate {
            runs: Some(vec![TextRun::plain("new "), TextRun::styled("bold", RunStyle::bold(true))]),
            ..TextUpdate::default()
        });
        assert_eq!(text.text(), "new bold");
        assert_synced(&text);
    }

    #[test]
    fn test_bounds_grow_with_content_and_invalidate() {
        let mut text = element("Hi");
        let small = text.text_bounds();
        text.insert_text(2, " there, this is longer");
        let large = text.text_bounds();
        assert!(large.content_width > small.content_width);
        assert!((large.width - large.content_width - 2.0 * large.padding).abs() < 1e-9);

        text.insert_text(text.char_count(), "\nsecond line");
        let two_lines = text.text_bounds();
        assert!((two_lines.content_height - 2.0 * 20.0 * LINE_HEIGHT).abs() < 1e-9);
    }

    #[test]
    fn test_bold_is_wider() {
        let plain = element("Bold me");
        let mut bold = element("Bold me");
        bold.apply_style(0, 7, RunStyle::bold(true));
        assert!(bold.text_bounds().content_width > plain.text_bounds().content_width);
    }

    #[test]
    fn test_translate_keeps_size() {
        let mut text = element("Move");
        let before = text.text_bounds();
        text.translate(Vec2::new(10.0, 5.0));
        let after = text.text_bounds();
        assert!((after.x - before.x - 10.0).abs() < 1e-9);
        assert!((after.width - before.width).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test() {
        let text = element("Hello World");
        let center = text.bounds().center();
        assert!(text.hit_test(center, 0.0));
        assert!(!text.hit_test(Point::new(0.0, 0.0), 0.0));
    }

    #[test]
    fn test_deserialize_rederives_text_from_runs() {
        let json = r##"{
            "id": "x", "x": 1, "y": 2, "text": "stale",
            "runs": [{"text": "fr"}, {"text": "esh", "bold": true}],
            "color": "#000", "fontSize": 16
        }"##;
        let text: TextElement = serde_json::from_str(json).unwrap();
        assert_eq!(text.text(), "fresh");
        assert_synced(&text);
    }

    #[test]
    fn test_deserialize_plain_text_only() {
        let json = r##"{"id":"x","x":0,"y":0,"text":"legacy","color":"#000","fontSize":16}"##;
        let text: TextElement = serde_json::from_str(json).unwrap();
        assert_eq!(text.runs().len(), 1);
        assert_eq!(text.runs()[0].text, "legacy");
    }

    #[test]
    fn test_wire_format_omits_unset_options() {
        let mut text = element("a");
        text.apply_update(TextUpdate {
            list_type: Some(ListType::Bullet),
            ..TextUpdate::default()
        });
        let json = serde_json::to_value(&text).unwrap();
        assert_eq!(json["fontSize"], 20.0);
        assert_eq!(json["listType"], "bullet");
        assert!(json.get("link").is_none());
        assert!(json["runs"][0].get("bold").is_none());
    }

    #[test]
    fn test_glyph_boxes_skip_whitespace() {
        let text = element("a b");
        assert_eq!(text.glyph_boxes().len(), 2);
    }
}
