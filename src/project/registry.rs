//! Project registry: the list of named canvases and the active-selection
//! policy.
//!
//! Selection falls back through: explicit request → URL parameter →
//! last-used id from the KV store → first in list → create a fresh project
//! when the list is empty. Whatever wins is recorded as the last-used id.

use std::sync::Arc;

use crate::error::{MuralError, Result};
use crate::storage::kv::{KvStore, LAST_ACTIVE_KEY};
use crate::storage::store::ProjectStore;

use super::types::Project;

/// Name given to projects created implicitly by selection fallback.
const DEFAULT_PROJECT_NAME: &str = "Untitled";

/// The project list plus its storage and local-state backends.
pub struct ProjectRegistry {
    store: Arc<dyn ProjectStore>,
    kv: Arc<dyn KvStore>,
    projects: Vec<Project>,
}

impl ProjectRegistry {
    /// Load the registry from storage.
    pub async fn load(store: Arc<dyn ProjectStore>, kv: Arc<dyn KvStore>) -> Result<Self> {
        let projects = store.list().await?;
        tracing::info!(count = projects.len(), "loaded project list");
        Ok(Self {
            store,
            kv,
            projects,
        })
    }

    /// All projects, newest first.
    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Look up a project by id.
    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    /// Create a project with the given name, persisting it immediately.
    ///
    /// The new project is listed first, mirroring the backend's ordering.
    pub async fn create(&mut self, name: &str) -> Result<Project> {
        let project = Project::new(name);
        self.store.upsert(&project).await?;
        self.projects.insert(0, project.clone());
        tracing::info!(id = %project.id, name, "created project");
        Ok(project)
    }

    /// Persist a project and refresh the local list entry.
    pub async fn save(&mut self, project: Project) -> Result<()> {
        self.store.upsert(&project).await?;
        match self.projects.iter_mut().find(|p| p.id == project.id) {
            Some(existing) => *existing = project,
            None => self.projects.insert(0, project),
        }
        Ok(())
    }

    /// Delete a project from the backend and the local list.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        self.store.delete(id).await?;
        self.projects.retain(|p| p.id != id);
        if self.kv.get(LAST_ACTIVE_KEY).await?.as_deref() == Some(id) {
            self.kv.remove(LAST_ACTIVE_KEY).await?;
        }
        tracing::info!(id, "deleted project");
        Ok(())
    }

    /// Resolve the active project.
    ///
    /// `explicit` is a direct user request; `url_param` is the id carried
    /// by the page URL. The first candidate that exists wins; with no
    /// candidates and no projects at all, a fresh one is created. The
    /// winner is recorded as the last-used id.
    pub async fn select_current(
        &mut self,
        explicit: Option<&str>,
        url_param: Option<&str>,
    ) -> Result<Project> {
        let last_used = self.kv.get(LAST_ACTIVE_KEY).await?;
        let candidates = [explicit, url_param, last_used.as_deref()];
        let chosen = candidates
            .iter()
            .flatten()
            .find_map(|id| self.get(id))
            .or_else(|| self.projects.first())
            .cloned();

        let project = match chosen {
            Some(project) => project,
            None => self.create(DEFAULT_PROJECT_NAME).await?,
        };
        self.kv.set(LAST_ACTIVE_KEY, &project.id).await?;
        Ok(project)
    }

    /// Reload the project list from storage, keeping backends.
    pub async fn refresh(&mut self) -> Result<()> {
        self.projects = self.store.list().await?;
        Ok(())
    }
}

impl std::fmt::Debug for ProjectRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProjectRegistry")
            .field("projects", &self.projects.len())
            .finish()
    }
}

/// Ensure a project id names an existing project.
pub fn require_project<'a>(registry: &'a ProjectRegistry, id: &str) -> Result<&'a Project> {
    registry
        .get(id)
        .ok_or_else(|| MuralError::SessionError(format!("unknown project: {id}")))
}
