//! In-memory canvas store.

use super::{
    BoxFuture, CanvasData, CanvasListItem, CanvasPatch, CanvasStore, DEFAULT_CANVAS_NAME,
    StorageError, StorageResult, now_millis, sort_listing,
};
use std::collections::HashMap;
use std::sync::RwLock;

/// In-memory store for testing and ephemeral use.
#[derive(Default)]
pub struct MemoryStore {
    canvases: RwLock<HashMap<String, CanvasData>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock_error(e: impl std::fmt::Display) -> StorageError {
    StorageError::Other(format!("Lock error: {}", e))
}

impl CanvasStore for MemoryStore {
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<CanvasListItem>>> {
        Box::pin(async move {
            let canvases = self.canvases.read().map_err(lock_error)?;
            let mut items: Vec<_> = canvases.values().map(CanvasData::list_item).collect();
            sort_listing(&mut items);
            Ok(items)
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasData>> {
        let id = id.to_string();
        Box::pin(async move {
            let canvases = self.canvases.read().map_err(lock_error)?;
            canvases.get(&id).cloned().ok_or(StorageError::NotFound(id))
        })
    }

    fn create(&self, initial: CanvasPatch) -> BoxFuture<'_, StorageResult<CanvasData>> {
        Box::pin(async move {
            let now = now_millis();
            let id = uuid::Uuid::new_v4().to_string();
            let data = CanvasData::from_patch(id.clone(), DEFAULT_CANVAS_NAME, initial, now, now);
            let mut canvases = self.canvases.write().map_err(lock_error)?;
            canvases.insert(id, data.clone());
            Ok(data)
        })
    }

    fn update(&self, id: &str, patch: CanvasPatch) -> BoxFuture<'_, StorageResult<CanvasData>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut canvases = self.canvases.write().map_err(lock_error)?;
            let data = canvases.get_mut(&id).ok_or_else(|| StorageError::NotFound(id.clone()))?;
            data.apply_patch(patch);
            data.updated_at = now_millis().max(data.updated_at);
            Ok(data.clone())
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut canvases = self.canvases.write().map_err(lock_error)?;
            canvases.remove(&id).map(|_| ()).ok_or(StorageError::NotFound(id))
        })
    }
}
