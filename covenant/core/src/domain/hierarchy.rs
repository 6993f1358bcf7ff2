// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Project hierarchy interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::company::{ClaGroup, ProjectClaGroup};

/// External project record (SFID + display name).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSummary {
    pub sfid: String,
    pub name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HierarchyError {
    #[error("project directory request failed: {0}")]
    Remote(String),
}

/// Resolves external project records and the foundation/project structure
/// a CLA group is signed against.
#[async_trait]
pub trait ProjectHierarchyResolver: Send + Sync {
    /// External project lookup. `None` when the SFID is unknown.
    async fn project(&self, project_sfid: &str) -> Result<Option<ProjectSummary>, HierarchyError>;

    /// CLA group lookup by internal ID.
    async fn cla_group(&self, cla_group_id: &str) -> Result<Option<ClaGroup>, HierarchyError>;

    /// All (foundation, project) associations for a CLA group.
    async fn associated_projects(
        &self,
        cla_group_id: &str,
    ) -> Result<Vec<ProjectClaGroup>, HierarchyError>;

    /// Whether the group's CCLA is signed once at the foundation and
    /// implicitly covers all child projects. Derived from signature
    /// records by the remote service.
    async fn signed_at_foundation_level(&self, cla_group_id: &str)
        -> Result<bool, HierarchyError>;
}
