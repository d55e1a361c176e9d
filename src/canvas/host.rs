//! Capability interface over the visual editor.
//!
//! The actual editor is an external component; the rest of the crate only
//! needs scene accessors, file registration, and a change notification.
//! [`MemoryCanvas`] implements the same interface over an in-memory
//! [`CanvasDocument`] for headless use and tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::{Map, Value};
use tokio::sync::watch;

use super::document::{CanvasDocument, FileBlob};
use super::element::Element;

/// Accessors and mutators the visual editor must expose.
///
/// Mutations replace whole values rather than patching in place; combined
/// with the single-threaded-per-document usage pattern this keeps snapshots
/// consistent without long-held locks.
pub trait CanvasHost: Send + Sync {
    /// Current elements, in paint order.
    fn elements(&self) -> Vec<Element>;

    /// Current file map.
    fn files(&self) -> BTreeMap<String, FileBlob>;

    /// Current opaque view state.
    fn view_state(&self) -> Map<String, Value>;

    /// Register file blobs (merging by id).
    fn add_files(&self, files: Vec<FileBlob>);

    /// Replace the element list.
    fn update_scene(&self, elements: Vec<Element>);

    /// Change notification: the receiver observes a generation counter that
    /// bumps on every mutation. Used by the save coalescer's debounce.
    fn changes(&self) -> watch::Receiver<u64>;

    /// Capture a sanitized snapshot of the full document as of now.
    fn snapshot(&self) -> CanvasDocument {
        CanvasDocument {
            elements: self.elements(),
            app_state: self.view_state(),
            files: self.files(),
        }
        .sanitized()
    }
}

/// In-memory canvas document store.
///
/// Cheaply cloneable; clones share the same document and change channel.
#[derive(Clone)]
pub struct MemoryCanvas {
    document: Arc<Mutex<CanvasDocument>>,
    generation: Arc<watch::Sender<u64>>,
}

impl MemoryCanvas {
    /// Create an empty canvas.
    pub fn new() -> Self {
        Self::with_document(CanvasDocument::new())
    }

    /// Create a canvas holding the given document (sanitized on load).
    pub fn with_document(document: CanvasDocument) -> Self {
        let (tx, _rx) = watch::channel(0);
        Self {
            document: Arc::new(Mutex::new(document.sanitized())),
            generation: Arc::new(tx),
        }
    }

    /// Replace the whole document (e.g. when switching projects).
    pub fn load(&self, document: CanvasDocument) {
        if let Ok(mut doc) = self.document.lock() {
            *doc = document.sanitized();
        }
        self.bump();
    }

    /// Merge the view state with the given entries.
    pub fn set_view_state(&self, entries: Map<String, Value>) {
        if let Ok(mut doc) = self.document.lock() {
            for (key, value) in entries {
                doc.app_state.insert(key, value);
            }
        }
        self.bump();
    }

    fn bump(&self) {
        self.generation.send_modify(|g| *g += 1);
    }
}

impl Default for MemoryCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasHost for MemoryCanvas {
    fn elements(&self) -> Vec<Element> {
        self.document
            .lock()
            .map(|doc| doc.elements.clone())
            .unwrap_or_default()
    }

    fn files(&self) -> BTreeMap<String, FileBlob> {
        self.document
            .lock()
            .map(|doc| doc.files.clone())
            .unwrap_or_default()
    }

    fn view_state(&self) -> Map<String, Value> {
        self.document
            .lock()
            .map(|doc| doc.app_state.clone())
            .unwrap_or_default()
    }

    fn add_files(&self, files: Vec<FileBlob>) {
        if let Ok(mut doc) = self.document.lock() {
            for file in files {
                doc.files.insert(file.id.clone(), file);
            }
        }
        self.bump();
    }

    fn update_scene(&self, elements: Vec<Element>) {
        if let Ok(mut doc) = self.document.lock() {
            doc.elements = elements;
        }
        self.bump();
    }

    fn changes(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}
