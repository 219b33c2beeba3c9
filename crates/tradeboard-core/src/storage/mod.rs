//! Storage abstraction for canvas persistence.

mod adapter;
mod autosave;
mod file;
mod memory;
mod thumbnail;

pub use adapter::PersistenceAdapter;
pub use autosave::{AutoSaveManager, DEFAULT_AUTOSAVE_INTERVAL_SECS};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use thumbnail::{
    DEFAULT_THUMBNAIL_QUALITY, RenderSurface, capture_thumbnail, capture_thumbnail_with_quality,
    thumbnail_size,
};

use crate::camera::TransformState;
use crate::shapes::{Stroke, TextElement};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Name given to canvases created without one.
pub const DEFAULT_CANVAS_NAME: &str = "Untitled";

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Canvas not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("Storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Boxed future for async storage operations.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Current time in epoch milliseconds.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// A persisted canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasData {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub strokes: Vec<Stroke>,
    #[serde(default)]
    pub texts: Vec<TextElement>,
    #[serde(default)]
    pub transform: TransformState,
    /// Epoch millis.
    pub created_at: i64,
    /// Epoch millis.
    pub updated_at: i64,
    /// Encoded image (data URL).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CanvasData {
    /// Build a canvas from an initial patch. Missing fields take empty defaults.
    pub fn from_patch(
        id: impl Into<String>,
        default_name: impl Into<String>,
        patch: CanvasPatch,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        let mut data = Self {
            id: id.into(),
            name: default_name.into(),
            strokes: Vec::new(),
            texts: Vec::new(),
            transform: TransformState::default(),
            created_at,
            updated_at,
            thumbnail: None,
        };
        data.apply_patch(patch);
        data
    }

    /// Overwrite the fields present in the patch.
    pub fn apply_patch(&mut self, patch: CanvasPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(strokes) = patch.strokes {
            self.strokes = strokes;
        }
        if let Some(texts) = patch.texts {
            self.texts = texts;
        }
        if let Some(transform) = patch.transform {
            self.transform = transform;
        }
        if let Some(thumbnail) = patch.thumbnail {
            self.thumbnail = Some(thumbnail);
        }
    }

    /// Listing projection.
    pub fn list_item(&self) -> CanvasListItem {
        CanvasListItem {
            id: self.id.clone(),
            name: self.name.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            thumbnail: self.thumbnail.clone(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Lightweight projection of a canvas for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasListItem {
    pub id: String,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

/// Partial canvas data for create and update calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanvasPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strokes: Option<Vec<Stroke>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texts: Option<Vec<TextElement>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
}

impl CanvasPatch {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }
}

/// Trait for canvas storage backends.
///
/// Stores assign ids and timestamps. Listings are ordered most recently
/// updated first.
pub trait CanvasStore: Send + Sync {
    /// List all canvases.
    fn list(&self) -> BoxFuture<'_, StorageResult<Vec<CanvasListItem>>>;

    /// Load a canvas.
    fn get(&self, id: &str) -> BoxFuture<'_, StorageResult<CanvasData>>;

    /// Create a canvas from initial data.
    fn create(&self, initial: CanvasPatch) -> BoxFuture<'_, StorageResult<CanvasData>>;

    /// Apply a partial update to a canvas.
    fn update(&self, id: &str, patch: CanvasPatch) -> BoxFuture<'_, StorageResult<CanvasData>>;

    /// Delete a canvas.
    fn delete(&self, id: &str) -> BoxFuture<'_, StorageResult<()>>;
}

fn sort_listing(items: &mut [CanvasListItem]) {
    items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
}

/// Simple blocking executor for tests.
#[cfg(test)]
pub(crate) fn block_on<F: std::future::Future>(f: F) -> F::Output {
    use std::task::{Context, Poll, RawWaker, RawWakerVTable, Waker};

    fn dummy_raw_waker() -> RawWaker {
        fn no_op(_: *const ()) {}
        fn clone(_: *const ()) -> RawWaker {
            dummy_raw_waker()
        }
        static VTABLE: RawWakerVTable = RawWakerVTable::new(clone, no_op, no_op, no_op);
        RawWaker::new(std::ptr::null(), &VTABLE)
    }

    let waker = unsafe { Waker::from_raw(dummy_raw_waker()) };
    let mut cx = Context::from_waker(&waker);
    let mut f = std::pin::pin!(f);

    loop {
        if let Poll::Ready(result) = f.as_mut().poll(&mut cx) {
            return result;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    #[test]
    fn test_wire_format() {
        let data = CanvasData::from_patch(
            "c1",
            DEFAULT_CANVAS_NAME,
            CanvasPatch {
                strokes: Some(vec![Stroke::from_points(
                    vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                    "#000",
                    2.0,
                )]),
                ..CanvasPatch::default()
            },
            1_700_000_000_000,
            1_700_000_000_500,
        );
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["name"], "Untitled");
        assert_eq!(json["createdAt"], 1_700_000_000_000_i64);
        assert_eq!(json["updatedAt"], 1_700_000_000_500_i64);
        assert_eq!(json["transform"]["scale"], 1.0);
        assert_eq!(json["transform"]["offset"]["x"], 0.0);
        assert!(json.get("thumbnail").is_none());
    }

    #[test]
    fn test_apply_patch_only_touches_present_fields() {
        let mut data = CanvasData::from_patch("c1", "Week 12", CanvasPatch::default(), 1, 1);
        data.apply_patch(CanvasPatch {
            thumbnail: Some("data:image/jpeg;base64,AA".into()),
            ..CanvasPatch::default()
        });
        assert_eq!(data.name, "Week 12");
        assert!(data.thumbnail.is_some());
        assert_eq!(data.list_item().thumbnail, data.thumbnail);
    }

    #[test]
    fn test_sort_listing_most_recent_first() {
        let item = |id: &str, updated_at| CanvasListItem {
            id: id.into(),
            name: id.into(),
            created_at: 0,
            updated_at,
            thumbnail: None,
        };
        let mut items = vec![item("a", 1), item("b", 3), item("c", 2)];
        sort_listing(&mut items);
        let ids: Vec<_> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }
}
