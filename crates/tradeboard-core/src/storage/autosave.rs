//! Auto-save functionality for canvas persistence.
//!
//! Dirtiness is derived from the session's revision counter and the camera
//! transform: a save marks the revision and view it captured as persisted, so
//! edits made while the write is outstanding still count as unsaved.

use super::{CanvasData, CanvasPatch, CanvasStore, PersistenceAdapter, StorageResult};
use crate::camera::TransformState;
use crate::canvas::Canvas;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Manages periodic persistence of one canvas session.
///
/// Saves are sequenced by `&mut self`: a new save cannot start while a
/// previous one is being awaited.
pub struct AutoSaveManager<S: CanvasStore> {
    adapter: PersistenceAdapter<S>,
    /// Auto-save interval.
    interval: Duration,
    /// Last save timestamp.
    last_save: Option<Instant>,
    /// Revision persisted by the last successful save.
    saved_revision: Option<u64>,
    /// View transform persisted by the last successful save.
    saved_transform: Option<TransformState>,
    /// Canvas being saved; `None` until first created.
    canvas_id: Option<String>,
}

impl<S: CanvasStore> AutoSaveManager<S> {
    pub fn new(adapter: PersistenceAdapter<S>) -> Self {
        Self {
            adapter,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            saved_revision: None,
            saved_transform: None,
            canvas_id: None,
        }
    }

    /// Set the auto-save interval.
    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn canvas_id(&self) -> Option<&str> {
        self.canvas_id.as_deref()
    }

    /// Bind to an existing canvas id.
    pub fn set_canvas_id(&mut self, id: Option<String>) {
        self.canvas_id = id;
    }

    /// Treat the session's current content and view as persisted.
    pub fn mark_saved(&mut self, canvas: &Canvas) {
        self.mark_persisted(canvas.revision(), Some(canvas.camera.state()));
    }

    fn mark_persisted(&mut self, revision: u64, transform: Option<TransformState>) {
        self.saved_revision = Some(revision);
        if transform.is_some() {
            self.saved_transform = transform;
        }
        self.last_save = Some(Instant::now());
    }

    /// Whether the session has content or view changes newer than the last save.
    pub fn is_dirty(&self, canvas: &Canvas) -> bool {
        self.saved_revision != Some(canvas.revision())
            || self.saved_transform != Some(canvas.camera.state())
    }

    /// Dirty and the interval has elapsed since the last save.
    pub fn should_save(&self, canvas: &Canvas) -> bool {
        if !self.is_dirty(canvas) {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save if needed. Returns true if a save was performed.
    pub async fn maybe_save(&mut self, canvas: &Canvas) -> StorageResult<bool> {
        if !self.should_save(canvas) {
            return Ok(false);
        }
        self.save(canvas).await?;
        Ok(true)
    }

    /// Force a save of the session's current state.
    pub async fn save(&mut self, canvas: &Canvas) -> StorageResult<CanvasData> {
        self.save_revision(canvas.revision(), canvas.to_patch()).await
    }

    /// Save a patch captured at `revision`.
    ///
    /// Lets the caller keep editing the session while the write is in flight.
    pub async fn save_revision(
        &mut self,
        revision: u64,
        patch: CanvasPatch,
    ) -> StorageResult<CanvasData> {
        let transform = patch.transform;
        let data = self.adapter.save_patch(self.canvas_id.as_deref(), patch).await?;
        self.canvas_id = Some(data.id.clone());
        self.mark_persisted(revision, transform);
        Ok(data)
    }

    /// Load a canvas into the session. Returns false if it could not be loaded.
    pub async fn load(&mut self, id: &str, canvas: &mut Canvas) -> bool {
        match self.adapter.get(id).await {
            Some(data) => {
                canvas.load(&data);
                self.canvas_id = Some(data.id);
                self.mark_saved(canvas);
                true
            }
            None => false,
        }
    }
}
