//! Keyboard shortcut configuration and dispatch.
//!
//! Shortcuts are a declarative map from [`Action`] to a key chord. Dispatch
//! is a single lookup keyed by the normalized (key, modifiers) chord, and a
//! chord only matches when every modifier agrees.

use crate::config::ConfigError;
use crate::input::Modifiers;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Actions that can be bound to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Action {
    Undo,
    Redo,
    Pen,
    Eraser,
    Cursor,
    Text,
    Clear,
    #[serde(rename = "hideUI")]
    HideUi,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Undo,
        Action::Redo,
        Action::Pen,
        Action::Eraser,
        Action::Cursor,
        Action::Text,
        Action::Clear,
        Action::HideUi,
    ];

    pub fn description(&self) -> &'static str {
        match self {
            Action::Undo => "Undo",
            Action::Redo => "Redo",
            Action::Pen => "Pen tool",
            Action::Eraser => "Eraser tool",
            Action::Cursor => "Selection tool",
            Action::Text => "Text tool",
            Action::Clear => "Clear canvas",
            Action::HideUi => "Toggle interface",
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// A key with its required modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShortcutConfig {
    pub key: String,
    #[serde(default, skip_serializing_if = "is_false")]
    pub ctrl: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub shift: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub alt: bool,
}

impl ShortcutConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ctrl: false,
            shift: false,
            alt: false,
        }
    }

    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    pub fn with_shift(mut self) -> Self {
        self.shift = true;
        self
    }

    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Parse a chord like "Ctrl+Shift+Z" or "Delete". Modifiers may appear in any order.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ConfigError::InvalidShortcut("empty shortcut".to_string()));
        }
        // A trailing "++" means the key itself is '+'.
        let (body, plus_key) = match s.strip_suffix("++") {
            Some(body) => (body, true),
            None => (s, s == "+"),
        };

        let mut config = Self::new(String::new());
        let mut key = None;
        for part in body.split('+').map(str::trim).filter(|p| !p.is_empty()) {
            match part.to_ascii_lowercase().as_str() {
                "ctrl" | "control" | "cmd" | "meta" => config.ctrl = true,
                "shift" => config.shift = true,
                "alt" | "option" => config.alt = true,
                _ if key.is_some() => {
                    return Err(ConfigError::InvalidShortcut(format!("more than one key in '{s}'")));
                }
                _ => key = Some(part.to_string()),
            }
        }
        config.key = match (key, plus_key) {
            (None, true) => "+".to_string(),
            (Some(key), false) => key,
            _ => return Err(ConfigError::InvalidShortcut(format!("no key in '{s}'"))),
        };
        Ok(config)
    }

    /// Format for display (e.g., "Ctrl+Shift+Z").
    pub fn format(&self) -> String {
        let mut parts = Vec::new();
        if self.ctrl {
            parts.push("Ctrl".to_string());
        }
        if self.shift {
            parts.push("Shift".to_string());
        }
        if self.alt {
            parts.push("Alt".to_string());
        }
        let key = if self.key.chars().count() == 1 {
            self.key.to_uppercase()
        } else {
            self.key.clone()
        };
        parts.push(key);
        parts.join("+")
    }

    /// Whether a key press matches this chord exactly.
    pub fn matches(&self, key: &str, modifiers: Modifiers) -> bool {
        self.chord() == Chord::new(key, modifiers)
    }

    fn chord(&self) -> Chord {
        Chord {
            key: normalize_key(&self.key),
            ctrl: self.ctrl,
            shift: self.shift,
            alt: self.alt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Chord {
    key: String,
    ctrl: bool,
    shift: bool,
    alt: bool,
}

impl Chord {
    fn new(key: &str, modifiers: Modifiers) -> Self {
        Self {
            key: normalize_key(key),
            ctrl: modifiers.command(),
            shift: modifiers.shift,
            alt: modifiers.alt,
        }
    }
}

fn normalize_key(key: &str) -> String {
    let key = key.trim();
    match key.to_ascii_lowercase().as_str() {
        "del" => "delete".to_string(),
        "esc" => "escape".to_string(),
        "space" | "spacebar" => " ".to_string(),
        lower => lower.to_string(),
    }
}

/// Action → chord configuration with a reverse lookup for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Action, ShortcutConfig>", into = "BTreeMap<Action, ShortcutConfig>")]
pub struct Shortcuts {
    bindings: BTreeMap<Action, ShortcutConfig>,
    #[serde(skip)]
    lookup: HashMap<Chord, Action>,
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self::from_bindings(default_bindings())
    }
}

fn default_bindings() -> BTreeMap<Action, ShortcutConfig> {
    BTreeMap::from([
        (Action::Undo, ShortcutConfig::new("z").with_ctrl()),
        (Action::Redo, ShortcutConfig::new("z").with_ctrl().with_shift()),
        (Action::Pen, ShortcutConfig::new("p")),
        (Action::Eraser, ShortcutConfig::new("e")),
        (Action::Cursor, ShortcutConfig::new("v")),
        (Action::Text, ShortcutConfig::new("t")),
        (Action::Clear, ShortcutConfig::new("Delete").with_shift()),
        (Action::HideUi, ShortcutConfig::new("h")),
    ])
}

impl Shortcuts {
    fn from_bindings(bindings: BTreeMap<Action, ShortcutConfig>) -> Self {
        let mut shortcuts = Self {
            bindings,
            lookup: HashMap::new(),
        };
        shortcuts.rebuild_lookup();
        shortcuts
    }

    fn rebuild_lookup(&mut self) {
        self.lookup.clear();
        for (action, config) in &self.bindings {
            if let Some(previous) = self.lookup.insert(config.chord(), *action) {
                log::warn!(
                    "Shortcut {} is bound to both {:?} and {:?}; using {:?}",
                    config.format(),
                    previous,
                    action,
                    action
                );
            }
        }
    }

    /// Resolve a key press to its bound action.
    pub fn resolve(&self, key: &str, modifiers: Modifiers) -> Option<Action> {
        self.lookup.get(&Chord::new(key, modifiers)).copied()
    }

    pub fn get(&self, action: Action) -> Option<&ShortcutConfig> {
        self.bindings.get(&action)
    }

    /// Rebind an action.
    pub fn set(&mut self, action: Action, config: ShortcutConfig) {
        self.bindings.insert(action, config);
        self.rebuild_lookup();
    }

    pub fn iter(&self) -> impl Iterator<Item = (Action, &ShortcutConfig)> {
        self.bindings.iter().map(|(action, config)| (*action, config))
    }
}

impl From<BTreeMap<Action, ShortcutConfig>> for Shortcuts {
    /// Actions missing from a user configuration keep their default chord.
    fn from(overrides: BTreeMap<Action, ShortcutConfig>) -> Self {
        let mut bindings = default_bindings();
        bindings.extend(overrides);
        Self::from_bindings(bindings)
    }
}

impl From<Shortcuts> for BTreeMap<Action, ShortcutConfig> {
    fn from(shortcuts: Shortcuts) -> Self {
        shortcuts.bindings
    }
}
