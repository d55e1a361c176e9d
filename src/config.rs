//! Configuration types for the mural client engine.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{MuralError, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MuralConfig {
    /// Backend endpoint settings.
    pub backend: BackendConfig,
    /// Save-coalescing timing settings.
    pub save: SaveConfig,
    /// Canvas grid-packing settings.
    pub layout: LayoutConfig,
}

/// Backend endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the backend (no trailing slash).
    pub base_url: String,
    /// Path of the streaming chat endpoint.
    pub chat_path: String,
    /// Path of the project storage endpoint.
    pub canvases_path: String,
    /// Path of the image upload endpoint.
    pub upload_path: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000/api".into(),
            chat_path: "/chat".into(),
            canvases_path: "/canvases".into(),
            upload_path: "/upload-image".into(),
        }
    }
}

/// Save-coalescing timing configuration.
///
/// The canvas document is flushed after a short quiet period following a
/// change, by a periodic safety timer, and when the host reports visibility
/// loss. The safety and visibility flushes are gated on the time elapsed
/// since the last successful save.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Quiet period after a canvas change before a flush fires, in milliseconds.
    pub canvas_debounce_ms: u64,
    /// Period of the safety flush timer, in seconds.
    pub safety_interval_secs: u64,
    /// Minimum elapsed time since the last save for gated flushes, in seconds.
    pub min_save_gap_secs: u64,
    /// Quiet period after a message-list change before a flush fires, in milliseconds.
    pub message_debounce_ms: u64,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            canvas_debounce_ms: 500,
            safety_interval_secs: 30,
            min_save_gap_secs: 30,
            message_debounce_ms: 5_000,
        }
    }
}

impl SaveConfig {
    /// Canvas change debounce as a [`Duration`].
    pub fn canvas_debounce(&self) -> Duration {
        Duration::from_millis(self.canvas_debounce_ms)
    }

    /// Safety flush period as a [`Duration`].
    pub fn safety_interval(&self) -> Duration {
        Duration::from_secs(self.safety_interval_secs)
    }

    /// Minimum save gap as a [`Duration`].
    pub fn min_save_gap(&self) -> Duration {
        Duration::from_secs(self.min_save_gap_secs)
    }

    /// Message-list debounce as a [`Duration`].
    pub fn message_debounce(&self) -> Duration {
        Duration::from_millis(self.message_debounce_ms)
    }
}

/// Canvas grid-packing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Left edge of the packing area; the region left of this is reserved
    /// for fixed UI controls.
    pub origin_x: f64,
    /// Top edge of the packing area.
    pub origin_y: f64,
    /// Gap between neighboring elements, in canvas units.
    pub gap: f64,
    /// Maximum number of elements per packed row.
    pub max_columns: usize,
    /// Maximum display width for inserted images; height scales with aspect.
    pub max_display_width: f64,
    /// Natural size assumed when an image cannot be decoded.
    pub fallback_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            origin_x: 320.0,
            origin_y: 120.0,
            gap: 24.0,
            max_columns: 4,
            max_display_width: 300.0,
            fallback_size: 1024.0,
        }
    }
}

impl MuralConfig {
    /// Load configuration from a TOML file.
    ///
    /// Missing sections and fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            MuralError::ConfigError(format!("cannot read {}: {e}", path.display()))
        })?;
        toml::from_str(&text)
            .map_err(|e| MuralError::ConfigError(format!("cannot parse {}: {e}", path.display())))
    }

    /// Resolve a backend path against the base URL.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.backend.base_url.trim_end_matches('/'), path)
    }

    /// Full URL of the chat endpoint.
    pub fn chat_url(&self) -> String {
        self.endpoint(&self.backend.chat_path)
    }

    /// Full URL of the project storage endpoint.
    pub fn canvases_url(&self) -> String {
        self.endpoint(&self.backend.canvases_path)
    }

    /// Full URL of the image upload endpoint.
    pub fn upload_url(&self) -> String {
        self.endpoint(&self.backend.upload_path)
    }
}
