//! Engine tunables and persisted user preferences.

use crate::history::DEFAULT_HISTORY_LIMIT;
use crate::tools::Shortcuts;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid shortcut: {0}")]
    InvalidShortcut(String),
}

/// Engine tunables. Every field has a default so partial files load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Entries kept on each of the undo and redo stacks.
    pub history_limit: usize,
    /// Minimum distance between consecutive stroke samples, canvas units.
    pub min_stroke_distance: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Zoom factor per scroll step.
    pub zoom_step: f64,
    /// Hit-test tolerance in screen pixels.
    pub hit_tolerance: f64,
    pub pen_color: String,
    pub pen_size: f64,
    /// Eraser footprint radius, canvas units.
    pub eraser_size: f64,
    pub font_size: f64,
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    /// JPEG quality (1-100).
    pub thumbnail_quality: u8,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            min_stroke_distance: 2.0,
            min_scale: crate::camera::DEFAULT_MIN_SCALE,
            max_scale: crate::camera::DEFAULT_MAX_SCALE,
            zoom_step: 1.1,
            hit_tolerance: 6.0,
            pen_color: "#000000".to_string(),
            pen_size: 3.0,
            eraser_size: 12.0,
            font_size: 20.0,
            thumbnail_width: 320,
            thumbnail_height: 240,
            thumbnail_quality: 70,
        }
    }
}

/// User preferences: engine tunables plus keyboard shortcuts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub engine: EngineConfig,
    pub shortcuts: Shortcuts,
}

impl Preferences {
    /// Default preferences file location.
    ///
    /// On Linux: `~/.config/tradeboard/preferences.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tradeboard").join("preferences.json"))
    }

    /// Load preferences. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("No preferences at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write preferences, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}
