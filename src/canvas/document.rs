//! The canvas document: elements, embedded files, and opaque view state.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::element::Element;

/// Key of the transient presence list inside the view state.
///
/// The editor populates it with non-serializable live-collaborator state;
/// persisting it crashes the editor on reload, so it is stripped from every
/// snapshot and every loaded document.
const COLLABORATORS_KEY: &str = "collaborators";

/// An embedded file blob, keyed by id in the document's file map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileBlob {
    /// File identifier; elements reference it via `fileId`.
    pub id: String,
    /// MIME type of the payload.
    pub mime_type: String,
    /// The payload as a data URL (or a plain URL when the payload could
    /// not be inlined).
    #[serde(rename = "dataURL")]
    pub data_url: String,
    /// Creation time, unix milliseconds.
    pub created: u64,
}

/// One project's persisted visual scene.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasDocument {
    /// Drawable elements in paint order.
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Opaque view state (pan/zoom/selection/theme). Only the collaborator
    /// key is interpreted, and only to remove it.
    #[serde(default)]
    pub app_state: Map<String, Value>,
    /// Embedded file blobs keyed by file id.
    #[serde(default)]
    pub files: BTreeMap<String, FileBlob>,
}

impl CanvasDocument {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the document has no elements and no files.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty() && self.files.is_empty()
    }

    /// Strip non-persistable view state in place.
    pub fn sanitize(&mut self) {
        self.app_state.remove(COLLABORATORS_KEY);
    }

    /// Sanitized copy.
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }

    /// Leniently decode a document from a raw JSON value.
    ///
    /// Absent or malformed parts default to empty containers; the result is
    /// always sanitized. Used when loading project documents whose `data`
    /// field was written by an arbitrary editor version.
    pub fn from_value(value: &Value) -> Self {
        let elements = value
            .get("elements")
            .cloned()
            .and_then(|v| match serde_json::from_value::<Vec<Element>>(v) {
                Ok(elements) => Some(elements),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed canvas elements");
                    None
                }
            })
            .unwrap_or_default();
        let files = value
            .get("files")
            .cloned()
            .and_then(|v| match serde_json::from_value::<BTreeMap<String, FileBlob>>(v) {
                Ok(files) => Some(files),
                Err(e) => {
                    tracing::warn!(error = %e, "discarding malformed canvas files");
                    None
                }
            })
            .unwrap_or_default();
        let app_state = value
            .get("appState")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();

        Self {
            elements,
            app_state,
            files,
        }
        .sanitized()
    }

    /// Ids of files referenced by live image-like elements but missing from
    /// the file map. Broken references are tolerated by the view layer but
    /// indicate a data-integrity bug worth surfacing.
    pub fn dangling_file_refs(&self) -> Vec<&str> {
        self.elements
            .iter()
            .filter(|e| e.is_live_media())
            .filter_map(|e| e.file_id.as_deref())
            .filter(|id| !self.files.contains_key(*id))
            .collect()
    }
}
