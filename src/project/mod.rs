//! Projects: the storage document, the registry, and legacy migration.

pub mod migrate;
pub mod registry;
pub mod types;

pub use migrate::migrate_document;
pub use registry::ProjectRegistry;
pub use types::{LegacyImage, Project};
