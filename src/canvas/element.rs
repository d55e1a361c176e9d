//! Drawable elements of the canvas document.
//!
//! The element shape mirrors what the external visual editor persists:
//! camelCase fields, an `isDeleted` tombstone instead of removal, and a
//! `fileId` back-reference from image-like elements into the file map.
//! Unrecognized editor fields are kept in a flattened map so documents
//! written by the editor round-trip through this crate untouched.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What an element draws.
///
/// Serialized as the editor's lowercase type string; kinds this crate does
/// not interpret are preserved verbatim in [`ElementKind::Other`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Rectangle,
    Image,
    Embeddable,
    Video,
    Text,
    Other(String),
}

impl ElementKind {
    /// The editor's type string for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rectangle => "rectangle",
            Self::Image => "image",
            Self::Embeddable => "embeddable",
            Self::Video => "video",
            Self::Text => "text",
            Self::Other(s) => s,
        }
    }

    /// Whether this kind participates in grid packing (carries visual media).
    pub fn is_media(&self) -> bool {
        matches!(self, Self::Image | Self::Embeddable | Self::Video)
    }
}

impl From<&str> for ElementKind {
    fn from(s: &str) -> Self {
        match s {
            "rectangle" => Self::Rectangle,
            "image" => Self::Image,
            "embeddable" => Self::Embeddable,
            "video" => Self::Video,
            "text" => Self::Text,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Serialize for ElementKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ElementKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}

/// One drawable element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    /// Unique element identifier.
    pub id: String,
    /// Element kind (the editor's `type` field).
    #[serde(rename = "type")]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Tombstone flag; deleted elements stay in the list.
    #[serde(default)]
    pub is_deleted: bool,
    /// Back-reference into the document's file map (image-like kinds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
    /// Fill color (used by the white backing rectangle).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Fill style (used by the white backing rectangle).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_style: Option<String>,
    /// Stroke color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    /// Editor fields this crate does not interpret, preserved verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Element {
    /// Create an element of the given kind and geometry.
    pub fn new(id: impl Into<String>, kind: ElementKind, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            kind,
            x,
            y,
            width,
            height,
            is_deleted: false,
            file_id: None,
            background_color: None,
            fill_style: None,
            stroke_color: None,
            extra: Map::new(),
        }
    }

    /// Create an image element referencing a file blob.
    pub fn image(
        id: impl Into<String>,
        file_id: impl Into<String>,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    ) -> Self {
        Self {
            file_id: Some(file_id.into()),
            ..Self::new(id, ElementKind::Image, x, y, width, height)
        }
    }

    /// Create an opaque white backing rectangle.
    ///
    /// Inserted under each server-generated image so the image reads the
    /// same regardless of the canvas background color.
    pub fn backing_rectangle(id: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            background_color: Some("#ffffff".into()),
            fill_style: Some("solid".into()),
            stroke_color: Some("transparent".into()),
            ..Self::new(id, ElementKind::Rectangle, x, y, width, height)
        }
    }

    /// Right edge of the element.
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge of the element.
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether this element is live media: non-deleted and of a media kind.
    pub fn is_live_media(&self) -> bool {
        !self.is_deleted && self.kind.is_media()
    }
}
