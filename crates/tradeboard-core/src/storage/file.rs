//! File-based canvas store.

use super::{
    BoxFuture, CanvasData, CanvasListItem, CanvasPatch, CanvasStore, DEFAULT_CANVAS_NAME,
    StorageError, StorageResult, now_millis, sort_listing,
};
use std::fs;
use std::path::{Path, PathBuf};

/// Stores each canvas as a JSON document in a directory.
pub struct FileStore {
    /// Base directory for canvas files.
    base_path: PathBuf,
}

impl FileStore {
    /// Create a file store in the given directory, creating it if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("Failed to create storage directory: {}", e))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a file store in the default location.
    ///
    /// On Linux: `~/.local/share/tradeboard/canvases/`
    /// On Windows: `%LOCALAPPDATA%\tradeboard\canvases\`
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("Could not determine home directory".to_string()))?;
        Self::new(base.join("tradeboard").join("canvases"))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// File path for a canvas id.
    fn canvas_path(&self, id: &str) -> PathBuf {
        let safe_id: String = id
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_path.join(format!("{}.json", safe_id))
    }

    fn read(&self, id: &str) -> StorageResult<CanvasData> {
        let path = self.canvas_path(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        read_canvas(&path)
    }

    fn write(&self, data: &CanvasData) -> StorageResult<()> {
        let path = self.canvas_path(&data.id);
        let json = data
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        fs::write(&path, json)
            .map_err(|e| StorageError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }
}

fn read_canvas(path: &Path) -> StorageResult<CanvasData> {
    let json = fs::read_to_string(path)
        .map_err(|e| StorageError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
    CanvasData::from_json(&json).map_err(|e| {
        StorageError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
    })
}

impl CanvasStore for FileStore {
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<CanvasListItem>>> {
        Box::pin(async move {
            let entries = fs::read_dir(&self.base_path)
                .map_err(|e| StorageError::Io(format!("Failed to read directory: {}", e)))?;

            let mut items = Vec::new();
            for path in entries.flatten().map(|entry| entry.path()) {
                if path.extension().is_none_or(|ext| ext != "json") {
                    continue;
                }
                match read_canvas(&path) {
                    Ok(data) => items.push(data.list_item()),
                    Err(e) => log::warn!("Skipping unreadable canvas file: {}", e),
                }
            }
            sort_listing(&mut items);
            Ok(items)
        })
    }

    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasData>> {
        let result = self.read(id);
        Box::pin(async move { result })
    }

    fn create(&self, initial: CanvasPatch) -> BoxFuture<'_, StorageResult<CanvasData>> {
        Box::pin(async move {
            let now = now_millis();
            let id = uuid::Uuid::new_v4().to_string();
            let data = CanvasData::from_patch(id, DEFAULT_CANVAS_NAME, initial, now, now);
            self.write(&data)?;
            Ok(data)
        })
    }

    fn update(&self, id: &str, patch: CanvasPatch) -> BoxFuture<'_, StorageResult<CanvasData>> {
        let id = id.to_string();
        Box::pin(async move {
            let mut data = self.read(&id)?;
            data.apply_patch(patch);
            data.updated_at = now_millis().max(data.updated_at);
            self.write(&data)?;
            Ok(data)
        })
    }

    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>> {
        let path = self.canvas_path(id);
        let id = id.to_string();
        Box::pin(async move {
            if !path.exists() {
                return Err(StorageError::NotFound(id));
            }
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("Failed to delete {}: {}", path.display(), e))
            })
        })
    }
}
