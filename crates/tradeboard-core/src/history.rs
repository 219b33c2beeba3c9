//! Bounded undo/redo history over full document snapshots.

use crate::shapes::{Stroke, TextElement};
use std::collections::VecDeque;

/// Default number of entries kept on each stack.
pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Snapshot of the (strokes, texts) pair.
///
/// Snapshots are owned values: the history only ever stores clones, so no
/// snapshot shares storage with the live document or with another snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryState {
    pub strokes: Vec<Stroke>,
    pub texts: Vec<TextElement>,
}

impl HistoryState {
    pub fn new(strokes: Vec<Stroke>, texts: Vec<TextElement>) -> Self {
        Self { strokes, texts }
    }
}

/// Undo/redo stacks with FIFO eviction of the oldest entry.
#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<HistoryState>,
    future: VecDeque<HistoryState>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_limit(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a history holding at most `limit` entries per stack (minimum 1).
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            past: VecDeque::with_capacity(limit),
            future: VecDeque::with_capacity(limit),
            limit,
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Record the state prior to a pending mutation. Invalidates the redo chain.
    pub fn record(&mut self, before: HistoryState) {
        self.past.push_back(before);
        if self.past.len() > self.limit {
            self.past.pop_front();
            log::debug!("History full, evicted oldest entry (limit {})", self.limit);
        }
        self.future.clear();
    }

    /// Step back. Returns the state to restore, or `None` if there is nothing to undo.
    pub fn undo(&mut self, current: HistoryState) -> Option<HistoryState> {
        let previous = self.past.pop_back()?;
        push_bounded(&mut self.future, current, self.limit);
        Some(previous)
    }

    /// Step forward. Returns the state to restore, or `None` if there is nothing to redo.
    pub fn redo(&mut self, current: HistoryState) -> Option<HistoryState> {
        let next = self.future.pop_back()?;
        push_bounded(&mut self.past, current, self.limit);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.past.len()
    }

    pub fn redo_len(&self) -> usize {
        self.future.len()
    }

    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
    }
}

fn push_bounded(stack: &mut VecDeque<HistoryState>, state: HistoryState, limit: usize) {
    stack.push_back(state);
    if stack.len() > limit {
        stack.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn state(n: usize) -> HistoryState {
        let strokes = (0..n)
            .map(|i| {
                let x = i as f64;
                Stroke::from_points(vec![Point::new(x, 0.0), Point::new(x, 10.0)], "#000", 2.0)
            })
            .collect();
        HistoryState::new(strokes, Vec::new())
    }

    #[test]
    fn test_undo_redo_cycle() {
        let mut history = History::new();
        history.record(state(0));
        history.record(state(1));

        let restored = history.undo(state(2)).unwrap();
        assert_eq!(restored, state(1));
        let restored = history.undo(restored).unwrap();
        assert_eq!(restored, state(0));
        assert!(history.undo(state(0)).is_none());

        let again = history.redo(state(0)).unwrap();
        assert_eq!(again, state(1));
        let again = history.redo(again).unwrap();
        assert_eq!(again, state(2));
        assert!(history.redo(state(2)).is_none());
    }

    #[test]
    fn test_record_clears_redo() {
        let mut history = History::new();
        history.record(state(0));
        history.undo(state(1));
        assert!(history.can_redo());

        history.record(state(0));
        assert!(!history.can_redo());
        assert!(history.redo(state(5)).is_none());
    }

    #[test]
    fn test_bounded_eviction_drops_oldest() {
        let mut history = History::new();
        for i in 0..60 {
            history.record(state(i));
        }
        assert_eq!(history.undo_len(), DEFAULT_HISTORY_LIMIT);

        let mut current = state(60);
        let mut last = None;
        while let Some(previous) = history.undo(current.clone()) {
            current = previous.clone();
            last = Some(previous);
        }
        // Entries 0..10 were evicted.
        assert_eq!(last, Some(state(10)));
        assert_eq!(history.redo_len(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_custom_limit() {
        let mut history = History::with_limit(3);
        for i in 0..5 {
            history.record(state(i));
        }
        assert_eq!(history.undo_len(), 3);
    }

    #[test]
    fn test_snapshots_are_independent() {
        let mut history = History::new();
        let mut live = state(1);
        history.record(live.clone());
        live.strokes[0].points.push(Point::new(99.0, 99.0));

        let restored = history.undo(live).unwrap();
        assert_eq!(restored.strokes[0].len(), 2);
    }
}
