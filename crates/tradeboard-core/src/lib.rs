//! Tradeboard Core Library
//!
//! Platform-agnostic annotation engine for the Tradeboard whiteboard: freehand
//! strokes, rich-text annotations, pan/zoom, tool modes, undo/redo history,
//! hit-testing and the persistence contract.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod event_handler;
pub mod history;
pub mod input;
pub mod selection;
pub mod shapes;
pub mod storage;
pub mod tools;

pub use camera::{Camera, TransformState};
pub use canvas::{Canvas, CanvasDocument, CaretMove};
pub use config::{ConfigError, EngineConfig, Preferences};
pub use event_handler::EventHandler;
pub use history::{History, HistoryState};
pub use input::{InputEvent, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use selection::{Selection, SelectionBounds};
pub use shapes::{
    Element, ElementRef, ListType, RunStyle, Stroke, StrokeTool, TextBounds, TextElement, TextRun,
    TextUpdate,
};
pub use storage::{
    AutoSaveManager, CanvasData, CanvasListItem, CanvasPatch, CanvasStore, FileStore, MemoryStore,
    PersistenceAdapter, RenderSurface, StorageError, StorageResult, capture_thumbnail,
};
pub use tools::{Action, ShortcutConfig, Shortcuts, ToolKind, ToolManager};
