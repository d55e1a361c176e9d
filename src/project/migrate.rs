//! Legacy document migration.
//!
//! Projects written by old clients carry a flat list of positioned raster
//! images instead of the element/file canvas model. [`migrate_document`] is
//! a pure, idempotent function from either shape to a sanitized
//! [`CanvasDocument`]: current-shape input is decoded leniently and
//! sanitized; legacy input synthesizes one file blob and one image element
//! per legacy image.

use crate::canvas::document::{CanvasDocument, FileBlob};
use crate::canvas::element::Element;
use crate::canvas::insert::mime_for_url;

use super::types::{LegacyImage, Project};

/// Width and height assumed when a legacy image has no recorded geometry.
pub const LEGACY_FALLBACK_SIZE: f64 = 200.0;

/// Produce the current-shape canvas document for a project.
///
/// Running this twice over an already-migrated project is a no-op: the
/// first pass yields the current shape, and sanitizing a sanitized
/// document changes nothing.
pub fn migrate_document(project: &Project) -> CanvasDocument {
    match &project.data {
        Some(data) => CanvasDocument::from_value(data),
        None => {
            let images = project.images.as_deref().unwrap_or_default();
            if !images.is_empty() {
                tracing::info!(
                    project = %project.id,
                    count = images.len(),
                    "migrating legacy image list to canvas document"
                );
            }
            from_legacy(images)
        }
    }
}

fn from_legacy(images: &[LegacyImage]) -> CanvasDocument {
    let mut document = CanvasDocument::new();
    for (index, image) in images.iter().enumerate() {
        let file_id = image
            .id
            .clone()
            .unwrap_or_else(|| format!("legacy-file-{index}"));
        let element_id = format!("legacy-image-{index}");

        document.files.insert(
            file_id.clone(),
            FileBlob {
                id: file_id.clone(),
                mime_type: mime_for_url(&image.url).to_string(),
                data_url: image.url.clone(),
                created: 0,
            },
        );
        document.elements.push(Element::image(
            element_id,
            file_id,
            image.x.unwrap_or(0.0),
            image.y.unwrap_or(0.0),
            image.width.unwrap_or(LEGACY_FALLBACK_SIZE),
            image.height.unwrap_or(LEGACY_FALLBACK_SIZE),
        ));
    }
    document.sanitized()
}
