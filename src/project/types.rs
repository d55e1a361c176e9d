//! The project document: one named canvas plus its conversation.
//!
//! This is the unit the storage backend lists, upserts, and deletes. The
//! `data` field is kept as raw JSON on the wire: documents written by
//! arbitrary editor versions must survive a list/save round trip without
//! losing fields, and malformed data must degrade to an empty canvas
//! rather than failing the whole project (see [`crate::project::migrate`]).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::chat::message::Message;

/// A positioned raster image from the legacy document shape.
///
/// Earlier clients persisted a flat list of these instead of the
/// element/file canvas model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyImage {
    /// Identifier, when the writing client assigned one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Image location.
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

/// One project as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    /// Time-derived identifier, unique within the registry.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation time, epoch seconds.
    pub created_at: f64,
    /// Legacy flat image list, present only on documents written by old
    /// clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<LegacyImage>>,
    /// Canvas document as raw JSON (`elements`/`appState`/`files`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Conversation history.
    #[serde(default)]
    pub messages: Vec<Message>,
}

impl Project {
    /// Create an empty project with a fresh time-derived id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: generate_project_id(),
            name: name.into(),
            created_at: chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
            images: None,
            data: None,
            messages: Vec::new(),
        }
    }

    /// Whether this project still carries the legacy document shape.
    pub fn is_legacy(&self) -> bool {
        self.data.is_none() && self.images.as_ref().is_some_and(|i| !i.is_empty())
    }
}

/// Generate a unique project ID.
///
/// Format: `proj_{unix_millis}_{suffix}` where the suffix mixes the clock
/// and thread identity, keeping ids unique without an RNG dependency.
pub fn generate_project_id() -> String {
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0);
    format!("proj_{now}_{:06}", id_suffix())
}

fn id_suffix() -> u32 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let thread_id = std::thread::current().id();
    let hash = nanos.wrapping_mul(6364136223846793005).wrapping_add(
        format!("{thread_id:?}")
            .bytes()
            .fold(0u128, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u128)),
    );
    (hash % 1_000_000) as u32
}
