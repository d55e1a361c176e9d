//! Canvas: the document model, grid layout, image insertion, and the
//! capability interface over the visual editor.

pub mod document;
pub mod element;
pub mod host;
pub mod insert;
pub mod layout;

pub use document::{CanvasDocument, FileBlob};
pub use element::{Element, ElementKind};
pub use host::{CanvasHost, MemoryCanvas};
pub use insert::{insert_image, HttpImageFetcher, ImageFetcher};
