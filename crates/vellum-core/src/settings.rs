//! The process-wide settings record.
//!
//! Loaded once at startup and merged over hard-coded defaults:
//! `#[serde(default)]` on every section means fields introduced after a
//! settings file was written are still populated, and unknown keys in an
//! old file are tolerated. Persistence lives behind the Settings Port; this
//! module is only the record.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Main settings record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub editor: EditorSettings,
    pub ui: UiSettings,
    /// Chord string → command identifier overrides, e.g. `"ctrl+s" → "file.save"`.
    pub keybindings: HashMap<String, String>,
    /// Most-recent-first workspace roots.
    pub recent_workspaces: Vec<String>,
    /// Per-language server launch configuration.
    pub languages: HashMap<String, LanguageSettings>,
}

/// Editor behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorSettings {
    pub tab_size: usize,
    pub word_wrap: bool,
    pub cursor_style: CursorStyle,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            tab_size: 4,
            word_wrap: false,
            cursor_style: CursorStyle::Line,
        }
    }
}

/// Cursor visual style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorStyle {
    Line,
    Block,
    Underline,
}

impl Default for CursorStyle {
    fn default() -> Self {
        Self::Line
    }
}

/// Appearance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    /// Theme id, resolved against the built-in themes.
    pub theme: String,
    pub font_family: String,
    pub font_size: f32,
    pub line_height: f32,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            theme: "dark".to_string(),
            font_family: "JetBrains Mono".to_string(),
            font_size: 14.0,
            line_height: 1.4,
        }
    }
}

/// Language server launch configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanguageSettings {
    /// Server executable, e.g. `rust-analyzer`.
    pub server: Option<String>,
    pub server_args: Vec<String>,
    pub tab_size: Option<usize>,
}

impl Settings {
    /// Records a workspace root as most recently used: deduped,
    /// most-recent-first, capped at ten entries.
    pub fn remember_workspace(&mut self, root: &str) {
        self.recent_workspaces.retain(|r| r != root);
        self.recent_workspaces.insert(0, root.to_string());
        self.recent_workspaces.truncate(10);
    }
}
