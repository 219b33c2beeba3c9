//! Failure policy between the editing session and a canvas store.
//!
//! Reads degrade: a failed listing is an empty listing and a failed load is a
//! missing canvas, both logged. Writes are user intent and propagate.

use super::{CanvasData, CanvasListItem, CanvasPatch, CanvasStore, StorageError, StorageResult};
use crate::canvas::Canvas;
use std::sync::Arc;

/// Wraps a [`CanvasStore`] with the session's persistence policy.
pub struct PersistenceAdapter<S: CanvasStore> {
    store: Arc<S>,
}

impl<S: CanvasStore> Clone for PersistenceAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: CanvasStore> PersistenceAdapter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// List canvases. Failures yield an empty list.
    pub async fn list(&self) -> Vec<CanvasListItem> {
        match self.store.list().await {
            Ok(items) => items,
            Err(e) => {
                log::warn!("Failed to list canvases: {}", e);
                Vec::new()
            }
        }
    }

    /// Load a canvas. Failures are reported as not found.
    pub async fn get(&self, id: &str) -> Option<CanvasData> {
        match self.store.get(id).await {
            Ok(data) => Some(data),
            Err(StorageError::NotFound(_)) => {
                log::debug!("Canvas {} not found", id);
                None
            }
            Err(e) => {
                log::warn!("Failed to load canvas {}: {}", id, e);
                None
            }
        }
    }

    pub async fn create(&self, initial: CanvasPatch) -> StorageResult<CanvasData> {
        self.store.create(initial).await
    }

    pub async fn update(&self, id: &str, patch: CanvasPatch) -> StorageResult<CanvasData> {
        self.store.update(id, patch).await
    }

    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        self.store.delete(id).await
    }

    /// Write a session's current state: update `id` if given, otherwise create.
    ///
    /// An empty thumbnail (failed capture) is omitted from the write.
    pub async fn save_canvas(
        &self,
        id: Option<&str>,
        name: Option<&str>,
        canvas: &Canvas,
        thumbnail: Option<String>,
    ) -> StorageResult<CanvasData> {
        let mut patch = canvas.to_patch();
        patch.name = name.map(str::to_string);
        patch.thumbnail = thumbnail.filter(|t| !t.is_empty());
        self.save_patch(id, patch).await
    }

    /// Write a prepared patch: update `id` if given, otherwise create.
    pub async fn save_patch(
        &self,
        id: Option<&str>,
        patch: CanvasPatch,
    ) -> StorageResult<CanvasData> {
        let data = match id {
            Some(id) => self.store.update(id, patch).await?,
            None => self.store.create(patch).await?,
        };
        log::info!("Saved canvas {} ({})", data.id, data.name);
        Ok(data)
    }
}
