// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

//! Single-file JSON persistence: one ordered list of projects, rewritten
//! whole on every mutation. Writes are serialized through an internal lock.

use crate::error::StoreError;
use crate::models::{Contribution, Project};
use crate::traits::{sort_newest_first, ProjectStore};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file reads as an empty project list.
    async fn read_all(&self) -> Result<Vec<Project>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    async fn write_all(&self, projects: &[Project]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let raw = serde_json::to_vec_pretty(projects)?;
        tokio::fs::write(&self.path, raw).await?;
        debug!(path = %self.path.display(), count = projects.len(), "project store written");
        Ok(())
    }
}

#[async_trait]
impl ProjectStore for JsonFileStore {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.read_all().await
    }

    async fn insert_project(&self, project: Project) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut projects = self.read_all().await?;
        projects.push(project);
        self.write_all(&projects).await
    }

    async fn find_by_pool(&self, pool_address: &str) -> Result<Option<Project>, StoreError> {
        let projects = self.read_all().await?;
        Ok(projects.into_iter().find(|p| p.matches_pool(pool_address)))
    }

    async fn append_contribution(
        &self,
        pool_address: &str,
        contribution: Contribution,
    ) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut projects = self.read_all().await?;
        let project = projects
            .iter_mut()
            .find(|p| p.matches_pool(pool_address))
            .ok_or_else(|| StoreError::ProjectNotFound(pool_address.to_string()))?;
        project.contributions.push(contribution);
        self.write_all(&projects).await
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
