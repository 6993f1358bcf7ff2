// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Role names, scope paths and the role catalog interface.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const CLA_MANAGER_ROLE: &str = "cla-manager";
pub const CLA_DESIGNEE_ROLE: &str = "cla-manager-designee";
pub const COMPANY_OWNER_ROLE: &str = "company-owner";

/// Opaque role identifier required by the scope ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleId(pub String);

impl RoleId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RoleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Scope path of a role grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopePath {
    /// Company-wide grant.
    Organization,
    /// Grant bounded to a (project, company) pair.
    ProjectOrganization,
}

impl ScopePath {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Organization => "organization",
            Self::ProjectOrganization => "project|organization",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("role not found in catalog: {0}")]
    UnknownRole(String),
    #[error("role catalog request failed: {0}")]
    Remote(String),
}

/// Resolves human-readable role names to the opaque identifiers the scope
/// ledger requires.
#[async_trait]
pub trait RoleCatalog: Send + Sync {
    async fn role_id(&self, role_name: &str) -> Result<RoleId, CatalogError>;
}
