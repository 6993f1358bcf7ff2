// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Scope ledger interface.
//!
//! The external authorization service is the single source of truth for
//! "who currently holds what role". The ledger enforces at most one active
//! scope per (role, subject, scope-path) with a conflict response rather
//! than upsert semantics, so callers must check-then-create.
//!
//! Contract: "not found" on existence and list queries is a negative
//! answer (`false` / empty / `None`), never an error. Implementations
//! normalize remote 404s into those shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::roles::{RoleId, ScopePath};

/// One admin role holder for an organization, as listed by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminScope {
    pub username: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The (role, subject, scope-path) tuple already has an active scope.
    /// This is the ledger's atomic create-if-absent signal and the sole
    /// concurrency-safety mechanism across engine invocations.
    #[error("role scope already exists")]
    Conflict,
    #[error("scope ledger request failed: {0}")]
    Remote(String),
}

/// Client contract for the external authorization (scope ledger) service.
#[async_trait]
pub trait ScopeLedger: Send + Sync {
    /// Does `user_id` already hold `role` for the (company, project) pair?
    /// Ledger 404 is `Ok(false)`.
    async fn has_role_scope(
        &self,
        role: &str,
        user_id: &str,
        company_sfid: &str,
        project_sfid: &str,
    ) -> Result<bool, LedgerError>;

    /// Create a role scope for the email's identity. `project_sfid: None`
    /// creates an organization-scoped grant, `Some` a project|organization
    /// grant. Duplicate tuples yield [`LedgerError::Conflict`].
    async fn create_scope(
        &self,
        email: &str,
        role_id: &RoleId,
        company_sfid: &str,
        project_sfid: Option<&str>,
    ) -> Result<(), LedgerError>;

    /// Delete a scope by its opaque identifier.
    async fn delete_scope(
        &self,
        company_sfid: &str,
        role_id: &RoleId,
        scope_id: &str,
        username: &str,
        email: &str,
    ) -> Result<(), LedgerError>;

    /// Resolve the opaque identifier of an existing scope; `None` when the
    /// subject holds no such scope.
    async fn resolve_scope_id(
        &self,
        company_sfid: &str,
        project_sfid: &str,
        role: &str,
        scope_path: ScopePath,
        username: &str,
    ) -> Result<Option<String>, LedgerError>;

    /// List admin role holders for an organization, optionally filtered by
    /// role name. Ledger 404 is an empty list.
    async fn list_admin_scopes(
        &self,
        company_sfid: &str,
        role_filter: Option<&str>,
    ) -> Result<Vec<AdminScope>, LedgerError>;

    /// Is the subject a company owner of the organization? 404 is `false`.
    async fn is_company_owner(&self, user_id: &str, org_id: &str) -> Result<bool, LedgerError>;
}
