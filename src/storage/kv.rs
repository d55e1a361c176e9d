//! Client-side persisted key-value state.
//!
//! Browser-local state from the original UI (last-active project, theme
//! preference, staged first prompt) is modeled as an injected key-value
//! store rather than ambient globals: written on specific transitions,
//! read once at startup or read-once-and-cleared at consumption time.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{MuralError, Result};

/// Key remembering the last-active project id across restarts.
pub const LAST_ACTIVE_KEY: &str = "last_active_project";

/// Key remembering the theme preference.
pub const THEME_KEY: &str = "theme";

/// Key of the staged first prompt for a freshly created project.
pub fn pending_prompt_key(project_id: &str) -> String {
    format!("pending_prompt/{project_id}")
}

/// Async key-value storage backend.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value, returning it if it existed.
    async fn remove(&self, key: &str) -> Result<Option<String>>;
}

/// In-memory store for testing and ephemeral usage.
///
/// Thread-safe and cheaply cloneable; contents are lost on drop.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.write().await;
        Ok(entries.remove(key))
    }
}

/// Store persisting to a single JSON file.
///
/// The file is read and rewritten whole on each operation; the state it
/// holds is a handful of short strings.
#[derive(Debug, Clone)]
pub struct FsKvStore {
    path: PathBuf,
}

impl FsKvStore {
    /// Create a store backed by the given file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Create a store at the platform-default location.
    pub fn default_location() -> Result<Self> {
        let base = dirs::data_dir()
            .ok_or_else(|| MuralError::KvError("no platform data directory".into()))?;
        Ok(Self::new(base.join("mural").join("state.json")))
    }

    fn read_all(&self) -> Result<HashMap<String, String>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(MuralError::KvError(format!(
                    "read {}: {e}",
                    self.path.display()
                )))
            }
        };
        match serde_json::from_str(&text) {
            Ok(entries) => Ok(entries),
            Err(e) => {
                // A corrupt state file resets rather than wedging startup.
                tracing::warn!(path = %self.path.display(), error = %e, "state file corrupt, resetting");
                Ok(HashMap::new())
            }
        }
    }

    fn write_all(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                MuralError::KvError(format!("create {}: {e}", parent.display()))
            })?;
        }
        let text = serde_json::to_string_pretty(entries)
            .map_err(|e| MuralError::KvError(format!("encode state: {e}")))?;
        std::fs::write(&self.path, text)
            .map_err(|e| MuralError::KvError(format!("write {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl KvStore for FsKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.read_all()?;
        entries.insert(key.to_string(), value.to_string());
        self.write_all(&entries)
    }

    async fn remove(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.read_all()?;
        let removed = entries.remove(key);
        if removed.is_some() {
            self.write_all(&entries)?;
        }
        Ok(removed)
    }
}

/// A staged first prompt for a freshly created project.
///
/// Written by the creation flow, consumed exactly once by the chat view on
/// first load, then cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingPrompt {
    /// The prompt text to auto-send.
    pub prompt: String,
    /// Image URLs attached to the prompt.
    #[serde(default)]
    pub image_urls: Vec<String>,
}

/// Stage a pending prompt for a project.
pub async fn stage_pending_prompt(
    kv: &dyn KvStore,
    project_id: &str,
    pending: &PendingPrompt,
) -> Result<()> {
    let encoded = serde_json::to_string(pending)
        .map_err(|e| MuralError::KvError(format!("encode pending prompt: {e}")))?;
    kv.set(&pending_prompt_key(project_id), &encoded).await
}

/// Consume the pending prompt for a project, clearing it.
///
/// A second call returns `None`; a corrupt staged value is dropped.
pub async fn take_pending_prompt(
    kv: &dyn KvStore,
    project_id: &str,
) -> Result<Option<PendingPrompt>> {
    let raw = kv.remove(&pending_prompt_key(project_id)).await?;
    Ok(raw.and_then(|text| match serde_json::from_str(&text) {
        Ok(pending) => Some(pending),
        Err(e) => {
            tracing::warn!(project_id, error = %e, "dropping corrupt pending prompt");
            None
        }
    }))
}
