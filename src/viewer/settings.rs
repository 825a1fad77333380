//! Persistent viewer settings

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Viewer settings that persist between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Window
    pub window_width: f32,
    pub window_height: f32,
    pub vsync: bool,

    // UI layout
    pub side_panel_width: f32,
    pub show_fps: bool,

    // Kernel override directory (PLAYGROUND_SHADER_DIR wins when set)
    pub shader_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            window_width: 1938.0,
            window_height: 1127.0,
            vsync: true,
            side_panel_width: 320.0,
            show_fps: true,
            shader_dir: None,
        }
    }
}

impl Settings {
    /// Get settings file path
    fn path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("playground-tracer");
            std::fs::create_dir_all(&p).ok();
            p.push("settings.json");
            p
        })
    }

    /// Load settings from the config directory
    pub fn load() -> Self {
        Self::path().map(|p| Self::load_from(&p)).unwrap_or_default()
    }

    /// Load settings from `path`; missing or unreadable files give defaults
    pub fn load_from(path: &Path) -> Self {
        let mut settings: Self = std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();

        if !(settings.window_width >= 64.0 && settings.window_height >= 64.0) {
            let defaults = Self::default();
            settings.window_width = defaults.window_width;
            settings.window_height = defaults.window_height;
        }
        settings
    }

    /// Save settings to the config directory
    pub fn save(&self) {
        if let Some(path) = Self::path() {
            if let Err(e) = self.save_to(&path) {
                tracing::warn!(path = %path.display(), "failed to save settings: {e}");
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
    }
}
