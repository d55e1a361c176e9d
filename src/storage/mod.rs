//! Storage backends: the project endpoints, image upload, and local
//! key-value state.

pub mod http;
pub mod kv;
pub mod store;

pub use http::{HttpProjectStore, ImageUploader};
pub use kv::{FsKvStore, KvStore, MemoryKvStore, PendingPrompt};
pub use store::{MemoryProjectStore, ProjectStore};
