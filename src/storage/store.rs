//! Project storage trait and in-memory implementation.
//!
//! Defines the [`ProjectStore`] trait mirroring the backend's project
//! endpoints, and provides [`MemoryProjectStore`] for testing and offline
//! usage. The HTTP implementation lives in [`crate::storage::http`].

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::project::types::Project;

/// Async project storage backend.
///
/// Upserts carry the full project document; the backend keeps unknown
/// fields verbatim. New projects are listed first.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// List all stored projects, newest first.
    async fn list(&self) -> Result<Vec<Project>>;

    /// Insert or replace one project by id.
    async fn upsert(&self, project: &Project) -> Result<()>;

    /// Delete one project by id. Deleting a missing project is not an error.
    async fn delete(&self, id: &str) -> Result<()>;
}

/// In-memory project store for testing and ephemeral usage.
///
/// Mirrors the backend's ordering behavior: upserting a new id prepends,
/// upserting an existing id replaces in place.
#[derive(Debug, Clone, Default)]
pub struct MemoryProjectStore {
    projects: Arc<RwLock<Vec<Project>>>,
}

impl MemoryProjectStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn list(&self) -> Result<Vec<Project>> {
        let projects = self.projects.read().await;
        Ok(projects.clone())
    }

    async fn upsert(&self, project: &Project) -> Result<()> {
        let mut projects = self.projects.write().await;
        match projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project.clone(),
            None => projects.insert(0, project.clone()),
        }
        Ok(())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut projects = self.projects.write().await;
        projects.retain(|p| p.id != id);
        Ok(())
    }
}
