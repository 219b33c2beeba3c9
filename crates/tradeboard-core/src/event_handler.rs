//! Routes raw input events to the canvas session according to the active tool.

use crate::canvas::{Canvas, CaretMove};
use crate::input::{InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent};
use crate::tools::{Action, Shortcuts, ToolKind};
use kurbo::{Point, Rect};

/// Pointer gesture in progress.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Gesture {
    Idle,
    Drawing,
    Erasing,
    /// Dragging the selection; `last` in canvas coordinates.
    Moving { last: Point },
    /// Rubber-band selection in canvas coordinates.
    Marquee { start: Point, current: Point, additive: bool },
    /// Middle-button pan; `last` in screen coordinates.
    Panning { last: Point },
}

/// Translates pointer and keyboard events into canvas operations.
#[derive(Debug, Clone)]
pub struct EventHandler {
    /// Key bindings used when no text element is being edited.
    pub shortcuts: Shortcuts,
    gesture: Gesture,
    hide_ui: bool,
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new(Shortcuts::default())
    }
}

impl EventHandler {
    pub fn new(shortcuts: Shortcuts) -> Self {
        Self {
            shortcuts,
            gesture: Gesture::Idle,
            hide_ui: false,
        }
    }

    /// Whether interface chrome (selection outlines, toolbars) is hidden.
    pub fn hide_ui(&self) -> bool {
        self.hide_ui
    }

    /// Rubber-band rectangle being dragged, in canvas coordinates.
    pub fn marquee(&self) -> Option<Rect> {
        match self.gesture {
            Gesture::Marquee { start, current, .. } => Some(Rect::from_points(start, current)),
            _ => None,
        }
    }

    /// Whether a pointer gesture is in progress.
    pub fn is_dragging(&self) -> bool {
        self.gesture != Gesture::Idle
    }

    pub fn handle(&mut self, canvas: &mut Canvas, event: &InputEvent) -> bool {
        match event {
            InputEvent::Pointer(event) => self.handle_pointer(canvas, event),
            InputEvent::Key(event) => self.handle_key(canvas, event),
        }
    }

    /// Process a pointer event. Returns true if it changed anything.
    pub fn handle_pointer(&mut self, canvas: &mut Canvas, event: &PointerEvent) -> bool {
        match *event {
            PointerEvent::Down {
                position,
                button,
                modifiers,
            } => self.pointer_down(canvas, position, button, modifiers),
            PointerEvent::Move { position, .. } => self.pointer_move(canvas, position),
            PointerEvent::Up { .. } => self.pointer_up(canvas),
            PointerEvent::Scroll {
                position,
                delta,
                modifiers,
            } => {
                if modifiers.command() {
                    let step = canvas.config().zoom_step;
                    let factor = if delta.y < 0.0 {
                        step
                    } else if delta.y > 0.0 {
                        1.0 / step
                    } else {
                        return false;
                    };
                    canvas.camera.zoom_at(position, factor);
                } else {
                    canvas.camera.pan_by(-delta);
                }
                true
            }
        }
    }

    fn pointer_down(
        &mut self,
        canvas: &mut Canvas,
        position: Point,
        button: MouseButton,
        modifiers: Modifiers,
    ) -> bool {
        match button {
            MouseButton::Middle => {
                self.gesture = Gesture::Panning { last: position };
                return true;
            }
            MouseButton::Right => return false,
            MouseButton::Left => {}
        }

        let point = canvas.to_canvas(position);
        match canvas.tool() {
            ToolKind::Pen => {
                canvas.begin_stroke(point);
                self.gesture = Gesture::Drawing;
            }
            ToolKind::Eraser => {
                canvas.begin_erase(point);
                self.gesture = Gesture::Erasing;
            }
            ToolKind::Text => {
                canvas.open_or_create_text(point);
            }
            ToolKind::Cursor => match canvas.hit_test(point) {
                Some(_) if modifiers.shift => {
                    canvas.select_at(point, true);
                }
                Some(item) => {
                    if !canvas.selection().contains(&item) {
                        canvas.select_at(point, false);
                    }
                    self.gesture = Gesture::Moving { last: point };
                }
                None => {
                    if !modifiers.shift {
                        canvas.clear_selection();
                    }
                    self.gesture = Gesture::Marquee {
                        start: point,
                        current: point,
                        additive: modifiers.shift,
                    };
                }
            },
        }
        true
    }

    fn pointer_move(&mut self, canvas: &mut Canvas, position: Point) -> bool {
        let point = canvas.to_canvas(position);
        match &mut self.gesture {
            Gesture::Idle => false,
            Gesture::Drawing => canvas.extend_stroke(point),
            Gesture::Erasing => canvas.erase_to(point) > 0,
            Gesture::Moving { last } => {
                canvas.move_selection(point - *last);
                *last = point;
                true
            }
            Gesture::Marquee { current, .. } => {
                *current = point;
                true
            }
            Gesture::Panning { last } => {
                canvas.camera.pan_by(position - *last);
                *last = position;
                true
            }
        }
    }

    fn pointer_up(&mut self, canvas: &mut Canvas) -> bool {
        match std::mem::replace(&mut self.gesture, Gesture::Idle) {
            Gesture::Idle => false,
            Gesture::Drawing => canvas.commit_stroke(),
            Gesture::Erasing => {
                canvas.end_erase();
                true
            }
            Gesture::Moving { .. } => {
                canvas.end_move();
                true
            }
            Gesture::Marquee {
                start,
                current,
                additive,
            } => {
                if start != current {
                    canvas.select_range(Rect::from_points(start, current), additive);
                }
                true
            }
            Gesture::Panning { .. } => true,
        }
    }

    /// Process a key event. Returns true if it was consumed.
    pub fn handle_key(&mut self, canvas: &mut Canvas, event: &KeyEvent) -> bool {
        let KeyEvent::Pressed { key, modifiers } = event else {
            return false;
        };
        let modifiers = *modifiers;

        if canvas.editing_text().is_some() && !modifiers.command() && self.edit_text(canvas, key) {
            return true;
        }

        if let Some(action) = self.shortcuts.resolve(key, modifiers) {
            self.perform(canvas, action);
            return true;
        }

        if canvas.tool() == ToolKind::Cursor && modifiers == Modifiers::NONE {
            match key.as_str() {
                "Delete" | "Backspace" => return canvas.delete_selection(),
                "Escape" => {
                    canvas.clear_selection();
                    return true;
                }
                _ => {}
            }
        }
        false
    }

    /// Key handling while a text element is open.
    fn edit_text(&mut self, canvas: &mut Canvas, key: &str) -> bool {
        match key {
            "Escape" => {
                canvas.finish_text_editing();
            }
            "Enter" => {
                canvas.insert_text("\n");
            }
            "Backspace" => {
                canvas.backspace();
            }
            "Delete" => {
                canvas.delete_forward();
            }
            "ArrowLeft" => canvas.move_caret(CaretMove::Left),
            "ArrowRight" => canvas.move_caret(CaretMove::Right),
            "Home" => canvas.move_caret(CaretMove::Home),
            "End" => canvas.move_caret(CaretMove::End),
            "Tab" => {
                canvas.insert_text("\t");
            }
            _ if key.chars().count() == 1 => {
                canvas.insert_text(key);
            }
            _ => return false,
        }
        true
    }

    /// Execute a bound action.
    pub fn perform(&mut self, canvas: &mut Canvas, action: Action) {
        if let Some(tool) = ToolKind::from_action(action) {
            self.gesture = Gesture::Idle;
            canvas.set_tool(tool);
            return;
        }
        match action {
            Action::Undo => {
                self.gesture = Gesture::Idle;
                canvas.undo();
            }
            Action::Redo => {
                self.gesture = Gesture::Idle;
                canvas.redo();
            }
            Action::Clear => {
                self.gesture = Gesture::Idle;
                canvas.clear();
            }
            Action::HideUi => self.hide_ui = !self.hide_ui,
            Action::Pen | Action::Eraser | Action::Cursor | Action::Text => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Vec2;

    fn down(x: f64, y: f64) -> PointerEvent {
        down_with(x, y, Modifiers::NONE)
    }

    fn down_with(x: f64, y: f64, modifiers: Modifiers) -> PointerEvent {
        PointerEvent::Down {
            position: Point::new(x, y),
            button: MouseButton::Left,
            modifiers,
        }
    }

    fn moved(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Move {
            position: Point::new(x, y),
            modifiers: Modifiers::NONE,
        }
    }

    fn up(x: f64, y: f64) -> PointerEvent {
        PointerEvent::Up {
            position: Point::new(x, y),
            button: MouseButton::Left,
        }
    }

    fn key(
        handler: &mut EventHandler,
        canvas: &mut Canvas,
        key: &str,
        modifiers: Modifiers,
    ) -> bool {
        handler.handle_key(canvas, &KeyEvent::pressed(key, modifiers))
    }

    fn drag(handler: &mut EventHandler, canvas: &mut Canvas, path: &[(f64, f64)]) {
        let (first, rest) = path.split_first().unwrap();
        handler.handle_pointer(canvas, &down(first.0, first.1));
        for p in rest {
            handler.handle_pointer(canvas, &moved(p.0, p.1));
        }
        let last = path.last().unwrap();
        handler.handle_pointer(canvas, &up(last.0, last.1));
    }

    fn setup() -> (EventHandler, Canvas) {
        (EventHandler::default(), Canvas::default())
    }

    #[test]
    fn test_pen_draw_undo_redo() {
        let (mut handler, mut canvas) = setup();
        key(&mut handler, &mut canvas, "p", Modifiers::NONE);
        assert_eq!(canvas.tool(), ToolKind::Pen);

        drag(&mut handler, &mut canvas, &[(0.0, 0.0), (10.0, 10.0), (20.0, 0.0)]);
        drag(&mut handler, &mut canvas, &[(50.0, 50.0), (80.0, 80.0)]);
        assert_eq!(canvas.strokes().len(), 2);

        key(&mut handler, &mut canvas, "z", Modifiers::ctrl());
        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.strokes()[0].len(), 3);

        let redo = Modifiers {
            ctrl: true,
            shift: true,
            ..Modifiers::NONE
        };
        key(&mut handler, &mut canvas, "Z", redo);
        assert_eq!(canvas.strokes().len(), 2);
    }

    #[test]
    fn test_strokes_use_canvas_coordinates() {
        let (mut handler, mut canvas) = setup();
        canvas.set_tool(ToolKind::Pen);
        canvas.camera.scale = 2.0;
        canvas.camera.offset = Point::new(100.0, 0.0);
        drag(&mut handler, &mut canvas, &[(100.0, 0.0), (140.0, 20.0)]);
        assert_eq!(canvas.strokes()[0].points, vec![Point::new(0.0, 0.0), Point::new(20.0, 10.0)]);
    }

    #[test]
    fn test_unbound_modifier_combination_is_ignored() {
        let (mut handler, mut canvas) = setup();
        let ctrl_alt = Modifiers {
            ctrl: true,
            alt: true,
            ..Modifiers::NONE
        };
        assert!(!key(&mut handler, &mut canvas, "p", ctrl_alt));
        assert_eq!(canvas.tool(), ToolKind::Cursor);
    }

    #[test]
    fn test_eraser_drag() {
        let (mut handler, mut canvas) = setup();
        canvas.set_tool(ToolKind::Pen);
        drag(&mut handler, &mut canvas, &[(0.0, 0.0), (100.0, 0.0)]);
        drag(&mut handler, &mut canvas, &[(0.0, 100.0), (100.0, 100.0)]);

        key(&mut handler, &mut canvas, "e", Modifiers::NONE);
        drag(&mut handler, &mut canvas, &[(50.0, -50.0), (50.0, 50.0)]);
        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.strokes()[0].points[0], Point::new(0.0, 100.0));

        key(&mut handler, &mut canvas, "z", Modifiers::ctrl());
        assert_eq!(canvas.strokes().len(), 2);
    }

    #[test]
    fn test_cursor_click_and_drag_moves_selection() {
        let (mut handler, mut canvas) = setup();
        canvas.set_tool(ToolKind::Pen);
        drag(&mut handler, &mut canvas, &[(0.0, 0.0), (100.0, 0.0)]);
        canvas.set_tool(ToolKind::Cursor);

        drag(&mut handler, &mut canvas, &[(50.0, 0.0), (55.0, 5.0), (60.0, 10.0)]);
        assert_eq!(canvas.selection().len(), 1);
        assert_eq!(canvas.strokes()[0].points[0], Point::new(10.0, 10.0));
        assert_eq!(canvas.history().undo_len(), 2);

        key(&mut handler, &mut canvas, "Delete", Modifiers::NONE);
        assert!(canvas.strokes().is_empty());
    }

    #[test]
    fn test_marquee_selection() {
        let (mut handler, mut canvas) = setup();
        canvas.set_tool(ToolKind::Pen);
        drag(&mut handler, &mut canvas, &[(0.0, 0.0), (20.0, 0.0)]);
        drag(&mut handler, &mut canvas, &[(0.0, 200.0), (20.0, 200.0)]);
        canvas.set_tool(ToolKind::Cursor);

        handler.handle_pointer(&mut canvas, &down(-10.0, -10.0));
        handler.handle_pointer(&mut canvas, &moved(30.0, 30.0));
        assert!(handler.marquee().is_some());
        handler.handle_pointer(&mut canvas, &up(30.0, 30.0));
        assert_eq!(canvas.selection().len(), 1);

        // Shift extends.
        handler.handle_pointer(&mut canvas, &down_with(-10.0, 190.0, Modifiers::shift()));
        handler.handle_pointer(&mut canvas, &moved(30.0, 210.0));
        handler.handle_pointer(&mut canvas, &up(30.0, 210.0));
        assert_eq!(canvas.selection().len(), 2);

        key(&mut handler, &mut canvas, "Escape", Modifiers::NONE);
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn test_shift_click_toggles() {
        let (mut handler, mut canvas) = setup();
        canvas.set_tool(ToolKind::Pen);
        drag(&mut handler, &mut canvas, &[(0.0, 0.0), (100.0, 0.0)]);
        drag(&mut handler, &mut canvas, &[(0.0, 50.0), (100.0, 50.0)]);
        canvas.set_tool(ToolKind::Cursor);

        drag(&mut handler, &mut canvas, &[(50.0, 0.0)]);
        handler.handle_pointer(&mut canvas, &down_with(50.0, 50.0, Modifiers::shift()));
        handler.handle_pointer(&mut canvas, &up(50.0, 50.0));
        assert_eq!(canvas.selection().len(), 2);
        handler.handle_pointer(&mut canvas, &down_with(50.0, 50.0, Modifiers::shift()));
        handler.handle_pointer(&mut canvas, &up(50.0, 50.0));
        assert_eq!(canvas.selection().len(), 1);
    }

    #[test]
    fn test_text_typing_session() {
        let (mut handler, mut canvas) = setup();
        key(&mut handler, &mut canvas, "t", Modifiers::NONE);
        drag(&mut handler, &mut canvas, &[(100.0, 100.0)]);
        assert!(canvas.editing_text().is_some());

        // Tool shortcuts are plain text while editing.
        for k in ["p", "e", "n"] {
            key(&mut handler, &mut canvas, k, Modifiers::NONE);
        }
        key(&mut handler, &mut canvas, "Enter", Modifiers::NONE);
        key(&mut handler, &mut canvas, "x", Modifiers::NONE);
        key(&mut handler, &mut canvas, "Backspace", Modifiers::NONE);
        key(&mut handler, &mut canvas, "Escape", Modifiers::NONE);

        assert_eq!(canvas.tool(), ToolKind::Text);
        assert!(canvas.editing_text().is_none());
        assert_eq!(canvas.texts()[0].text(), "pen\n");
        assert_eq!(canvas.history().undo_len(), 1);

        // Undo with a command chord works while editing too.
        drag(&mut handler, &mut canvas, &[(105.0, 105.0)]);
        key(&mut handler, &mut canvas, "z", Modifiers::ctrl());
        assert!(canvas.texts().is_empty());
    }

    #[test]
    fn test_click_away_discards_empty_text() {
        let (mut handler, mut canvas) = setup();
        canvas.set_tool(ToolKind::Text);
        drag(&mut handler, &mut canvas, &[(100.0, 100.0)]);
        drag(&mut handler, &mut canvas, &[(500.0, 500.0)]);
        assert_eq!(canvas.texts().len(), 1);
        key(&mut handler, &mut canvas, "v", Modifiers::NONE);
        // "v" was typed into the second element, so it survives.
        assert_eq!(canvas.texts().len(), 1);
        assert_eq!(canvas.texts()[0].text(), "v");
        key(&mut handler, &mut canvas, "Escape", Modifiers::NONE);
        key(&mut handler, &mut canvas, "v", Modifiers::NONE);
        assert_eq!(canvas.tool(), ToolKind::Cursor);
    }

    #[test]
    fn test_middle_drag_pans() {
        let (mut handler, mut canvas) = setup();
        handler.handle_pointer(&mut canvas, &PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Middle,
            modifiers: Modifiers::NONE,
        });
        handler.handle_pointer(&mut canvas, &moved(40.0, 30.0));
        handler.handle_pointer(&mut canvas, &PointerEvent::Up {
            position: Point::new(40.0, 30.0),
            button: MouseButton::Middle,
        });
        assert_eq!(canvas.camera.offset, Point::new(30.0, 20.0));
        assert!(!handler.is_dragging());
    }

    #[test]
    fn test_scroll_pans_and_ctrl_scroll_zooms() {
        let (mut handler, mut canvas) = setup();
        handler.handle_pointer(&mut canvas, &PointerEvent::Scroll {
            position: Point::ZERO,
            delta: Vec2::new(0.0, 15.0),
            modifiers: Modifiers::NONE,
        });
        assert_eq!(canvas.camera.offset, Point::new(0.0, -15.0));

        let cursor = Point::new(200.0, 100.0);
        let anchor = canvas.to_canvas(cursor);
        handler.handle_pointer(&mut canvas, &PointerEvent::Scroll {
            position: cursor,
            delta: Vec2::new(0.0, -1.0),
            modifiers: Modifiers::ctrl(),
        });
        assert!(canvas.camera.scale > 1.0);
        let back = canvas.camera.to_screen(anchor);
        assert!((back - cursor).hypot() < 1e-9);
    }

    #[test]
    fn test_hide_ui_and_clear() {
        let (mut handler, mut canvas) = setup();
        key(&mut handler, &mut canvas, "h", Modifiers::NONE);
        assert!(handler.hide_ui());
        key(&mut handler, &mut canvas, "H", Modifiers::NONE);
        assert!(!handler.hide_ui());

        canvas.set_tool(ToolKind::Pen);
        drag(&mut handler, &mut canvas, &[(0.0, 0.0), (50.0, 0.0)]);
        key(&mut handler, &mut canvas, "Delete", Modifiers::shift());
        assert!(canvas.strokes().is_empty());
        assert!(canvas.can_undo());
    }

    #[test]
    fn test_replayed_script() {
        let script = r#"[
            {"type":"pressed","key":"p"},
            {"type":"down","position":{"x":0,"y":0}},
            {"type":"move","position":{"x":10,"y":0}},
            {"type":"move","position":{"x":20,"y":5}},
            {"type":"up","position":{"x":20,"y":5}}
        ]"#;
        let events: Vec<InputEvent> = serde_json::from_str(script).unwrap();
        let (mut handler, mut canvas) = setup();
        for event in &events {
            handler.handle(&mut canvas, event);
        }
        assert_eq!(canvas.strokes().len(), 1);
        assert_eq!(canvas.strokes()[0].len(), 3);
    }
}
