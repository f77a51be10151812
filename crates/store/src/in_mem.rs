// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::StoreError;
use crate::models::{Contribution, Project};
use crate::traits::{sort_newest_first, ProjectStore};
use async_trait::async_trait;
use tokio::sync::RwLock;

/// Volatile store with the same semantics as the file-backed one. Used in
/// tests and as a backend when no store path is configured.
#[derive(Default)]
pub struct InMemoryStore {
    projects: RwLock<Vec<Project>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.read().await.clone())
    }

    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        self.projects.write().await.push(project);
        Ok(())
    }

    async fn find_by_pool(&self, pool_address: &str) -> Result<Option<Project>, StoreError> {
        Ok(self
            .projects
            .read()
            .await
            .iter()
            .find(|p| p.matches_pool(pool_address))
            .cloned())
    }

    async fn append_contribution(
        &self,
        pool_address: &str,
        contribution: Contribution,
    ) -> Result<(), StoreError> {
        let mut projects = self.projects.write().await;
        let project = projects
            .iter_mut()
            .find(|p| p.matches_pool(pool_address))
            .ok_or_else(|| StoreError::ProjectNotFound(pool_address.to_string()))?;
        project.contributions.push(contribution);
        Ok(())
    }

    async fn contributions(&self, pool_address: &str) -> Result<Vec<Contribution>, StoreError> {
        let mut contributions = self
            .find_by_pool(pool_address)
            .await?
            .ok_or_else(|| StoreError::ProjectNotFound(pool_address.to_string()))?
            .contributions;
        sort_newest_first(&mut contributions);
        Ok(contributions)
    }
}
