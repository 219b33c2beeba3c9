//! Hit-testing and multi-element selection.

use crate::canvas::CanvasDocument;
use crate::shapes::{Element, ElementRef, rects_overlap};
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Union of the bounds of the selected elements.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl SelectionBounds {
    pub fn from_rect(rect: Rect) -> Self {
        Self {
            min_x: rect.x0,
            min_y: rect.y0,
            max_x: rect.x1,
            max_y: rect.y1,
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.min_x, self.min_y, self.max_x, self.max_y)
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }
}

/// Ordered set of selected elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    items: Vec<ElementRef>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[ElementRef] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, item: &ElementRef) -> bool {
        self.items.contains(item)
    }

    /// Replace the selection with a single element.
    pub fn select(&mut self, item: ElementRef) {
        self.items.clear();
        self.items.push(item);
    }

    /// Replace the selection, dropping duplicates.
    pub fn set(&mut self, items: impl IntoIterator<Item = ElementRef>) {
        self.items.clear();
        for item in items {
            self.add(item);
        }
    }

    pub fn add(&mut self, item: ElementRef) {
        if !self.contains(&item) {
            self.items.push(item);
        }
    }

    /// Add the element if absent, otherwise remove it.
    pub fn toggle(&mut self, item: ElementRef) {
        match self.items.iter().position(|i| *i == item) {
            Some(index) => {
                self.items.remove(index);
            }
            None => self.items.push(item),
        }
    }

    pub fn remove(&mut self, item: &ElementRef) {
        self.items.retain(|i| i != item);
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Drop references that no longer resolve in the document.
    pub fn prune(&mut self, document: &CanvasDocument) {
        self.items.retain(|item| element_bounds(document, item).is_some());
    }
}

/// Topmost element under a canvas point.
///
/// Text boxes are painted above strokes, so they are tested first; within each
/// layer the last element in the sequence is on top.
pub fn hit_test(document: &CanvasDocument, point: Point, tolerance: f64) -> Option<ElementRef> {
    if let Some(text) = document
        .texts
        .iter()
        .rev()
        .find(|text| text.text_bounds().contains(point))
    {
        return Some(ElementRef::Text(text.id.clone()));
    }
    document
        .strokes
        .iter()
        .rposition(|stroke| stroke.hit_test(point, tolerance))
        .map(ElementRef::Stroke)
}

/// All elements whose bounds intersect the rectangle, in z-order.
pub fn select_range(document: &CanvasDocument, rect: Rect) -> Vec<ElementRef> {
    let rect = rect.abs();
    let strokes = document
        .strokes
        .iter()
        .enumerate()
        .filter(|(_, stroke)| !stroke.is_empty() && rects_overlap(stroke.bounds(), rect))
        .map(|(i, _)| ElementRef::Stroke(i));
    let texts = document
        .texts
        .iter()
        .filter(|text| rects_overlap(text.bounds(), rect))
        .map(|text| ElementRef::Text(text.id.clone()));
    strokes.chain(texts).collect()
}

/// Bounds of one element, or `None` if the reference is stale.
pub fn element_bounds(document: &CanvasDocument, item: &ElementRef) -> Option<Rect> {
    match item {
        ElementRef::Stroke(index) => document.strokes.get(*index).map(Element::bounds),
        ElementRef::Text(id) => document.text(id).map(Element::bounds),
    }
}

/// Union of the selected elements' bounds; `None` for an empty selection.
pub fn aggregate_bounds(
    document: &CanvasDocument,
    selection: &Selection,
) -> Option<SelectionBounds> {
    selection
        .items()
        .iter()
        .filter_map(|item| element_bounds(document, item))
        .reduce(|a, b| a.union(b))
        .map(SelectionBounds::from_rect)
}

/// Translate every referenced element by the same canvas delta.
pub fn move_elements(document: &mut CanvasDocument, items: &[ElementRef], delta: Vec2) {
    for item in items {
        match item {
            ElementRef::Stroke(index) => {
                if let Some(stroke) = document.strokes.get_mut(*index) {
                    stroke.translate(delta);
                }
            }
            ElementRef::Text(id) => {
                if let Some(text) = document.text_mut(id) {
                    text.translate(delta);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Stroke, TextElement};

    fn document() -> CanvasDocument {
        let mut doc = CanvasDocument::default();
        doc.strokes.push(Stroke::from_points(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            "#000",
            2.0,
        ));
        doc.strokes.push(Stroke::from_points(
            vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)],
            "#000",
            2.0,
        ));
        let label = TextElement::new("label", Point::new(200.0, 200.0), "#000", 20.0);
        doc.texts.push(label.with_text("Entry"));
        doc
    }

    #[test]
    fn test_hit_test_prefers_topmost_stroke() {
        let doc = document();
        // Both strokes meet at the origin; the later one is on top.
        assert_eq!(hit_test(&doc, Point::new(0.0, 0.0), 2.0), Some(ElementRef::Stroke(1)));
        assert_eq!(hit_test(&doc, Point::new(50.0, 1.0), 2.0), Some(ElementRef::Stroke(0)));
        assert_eq!(hit_test(&doc, Point::new(50.0, 50.0), 2.0), None);
    }

    #[test]
    fn test_hit_test_text_before_strokes() {
        let mut doc = document();
        doc.strokes.push(Stroke::from_points(
            vec![Point::new(190.0, 210.0), Point::new(300.0, 210.0)],
            "#000",
            2.0,
        ));
        let hit = hit_test(&doc, Point::new(210.0, 210.0), 2.0);
        assert_eq!(hit, Some(ElementRef::Text("label".into())));
    }

    #[test]
    fn test_select_range() {
        let doc = document();
        let hits = select_range(&doc, Rect::new(50.0, -10.0, 60.0, 10.0));
        assert_eq!(hits, vec![ElementRef::Stroke(0)]);

        let all = select_range(&doc, Rect::new(300.0, 300.0, -10.0, -10.0));
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_aggregate_bounds() {
        let doc = document();
        let mut selection = Selection::new();
        assert!(aggregate_bounds(&doc, &selection).is_none());

        selection.set([ElementRef::Stroke(0), ElementRef::Stroke(1)]);
        let bounds = aggregate_bounds(&doc, &selection).unwrap();
        assert!((bounds.min_x + 1.0).abs() < 1e-9);
        assert!((bounds.max_x - 101.0).abs() < 1e-9);
        assert!((bounds.max_y - 101.0).abs() < 1e-9);
    }

    #[test]
    fn test_move_elements() {
        let mut doc = document();
        let items = [ElementRef::Stroke(0), ElementRef::Text("label".into())];
        move_elements(&mut doc, &items, Vec2::new(10.0, 20.0));
        assert_eq!(doc.strokes[0].points[0], Point::new(10.0, 20.0));
        assert_eq!(doc.strokes[1].points[0], Point::new(0.0, 0.0));
        let text = doc.text("label").unwrap();
        assert!((text.x - 210.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_selection_toggle_and_prune() {
        let doc = document();
        let mut selection = Selection::new();
        selection.toggle(ElementRef::Stroke(0));
        selection.toggle(ElementRef::Stroke(7));
        selection.toggle(ElementRef::Stroke(0));
        assert_eq!(selection.items(), &[ElementRef::Stroke(7)]);
        selection.prune(&doc);
        assert!(selection.is_empty());
    }
}
