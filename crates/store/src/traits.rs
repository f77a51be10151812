// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::error::StoreError;
use crate::models::{Contribution, Project};
use async_trait::async_trait;

/// Persistence surface for projects and their contribution history. One
/// ordered list of projects; lookup is by case-insensitive pool address.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<Project>, StoreError>;

    async fn insert_project(&self, project: Project) -> Result<(), StoreError>;

    async fn find_by_pool(&self, pool_address: &str) -> Result<Option<Project>, StoreError>;

    /// Append one contribution record to the named pool's project.
    async fn append_contribution(
        &self,
        pool_address: &str,
        contribution: Contribution,
    ) -> Result<(), StoreError>;

    /// Contribution history of a pool, newest first.
    async fn contributions(&self, pool_address: &str) -> Result<Vec<Contribution>, StoreError>;
}

/// Newest-first ordering shared by both store implementations.
pub(crate) fn sort_newest_first(contributions: &mut [Contribution]) {
    contributions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
}
