// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Engine error taxonomy.
//!
//! One tagged enum replaces the original sentinel-value errors: callers
//! match on [`ErrorKind`] instead of comparing error identities, and every
//! variant carries the identifiers of the step that failed.

use std::fmt::Display;

/// Coarse classification used by the presentation layer for HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Company, project, identity, scope or signature absent (404).
    NotFound,
    /// Role scope already exists, or the project is already signed (409).
    Conflict,
    /// Malformed name or email, rejected before any external call (400).
    InvalidInput,
    /// An external service call failed for any other reason (400).
    Dependency,
}

/// Errors surfaced by the reconciliation engine.
#[derive(Debug, thiserror::Error)]
pub enum ClaManagerError {
    #[error("company not found for external ID: {company_sfid}")]
    CompanyNotFound { company_sfid: String },

    #[error("CLA group not found: {cla_group_id}")]
    ClaGroupNotFound { cla_group_id: String },

    #[error("project not found: {project_sfid}")]
    ProjectNotFound { project_sfid: String },

    /// The email or username has no account in the external identity
    /// directory.
    ///
    /// Terminal for the operation but not for the workflow: callers are
    /// expected to branch into the invitation flow on this kind.
    #[error("no identity account found for: {subject}")]
    IdentityNotFound { subject: String },

    #[error("CLA user not found: {user_id}")]
    ClaUserNotFound { user_id: String },

    #[error("no admins found for organization: {company_sfid}")]
    NoOrgAdmins { company_sfid: String },

    #[error("project {project_sfid} already has a signed CLA for company {company_sfid}")]
    ProjectAlreadySigned {
        company_sfid: String,
        project_sfid: String,
    },

    /// The identity already holds cla-manager-designee for the pair.
    #[error("user already assigned cla-manager-designee for company {company_sfid} and project {project_sfid}")]
    DesigneeRoleConflict {
        company_sfid: String,
        project_sfid: String,
    },

    /// The identity already holds the full cla-manager role for the pair.
    #[error("user is already cla-manager for company {company_sfid} and project {project_sfid}")]
    RoleScopeConflict {
        company_sfid: String,
        project_sfid: String,
    },

    /// Deletion requires the scope to exist, unlike creation which
    /// tolerates absence.
    #[error("scope not found for user {username} on project {project_sfid}")]
    ScopeNotFound {
        username: String,
        project_sfid: String,
    },

    #[error("signature not found for CLA group {cla_group_id} and company {company_id}")]
    SignatureNotFound {
        cla_group_id: String,
        company_id: String,
    },

    #[error("{0}")]
    InvalidInput(String),

    /// An external call failed; `context` names the step, the message
    /// wraps the underlying cause.
    #[error("{context}: {message}")]
    Dependency { context: String, message: String },
}

impl ClaManagerError {
    /// Wrap an external failure with the step that issued it.
    pub fn dependency(context: impl Into<String>, cause: impl Display) -> Self {
        Self::Dependency {
            context: context.into(),
            message: cause.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CompanyNotFound { .. }
            | Self::ClaGroupNotFound { .. }
            | Self::ProjectNotFound { .. }
            | Self::IdentityNotFound { .. }
            | Self::ClaUserNotFound { .. }
            | Self::NoOrgAdmins { .. }
            | Self::ScopeNotFound { .. }
            | Self::SignatureNotFound { .. } => ErrorKind::NotFound,
            Self::ProjectAlreadySigned { .. }
            | Self::DesigneeRoleConflict { .. }
            | Self::RoleScopeConflict { .. } => ErrorKind::Conflict,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Dependency { .. } => ErrorKind::Dependency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_taxonomy() {
        let not_found = ClaManagerError::CompanyNotFound {
            company_sfid: "SFDC-1".into(),
        };
        assert_eq!(not_found.kind(), ErrorKind::NotFound);

        let conflict = ClaManagerError::DesigneeRoleConflict {
            company_sfid: "SFDC-1".into(),
            project_sfid: "proj-42".into(),
        };
        assert_eq!(conflict.kind(), ErrorKind::Conflict);

        let invalid = ClaManagerError::InvalidInput("bad email".into());
        assert_eq!(invalid.kind(), ErrorKind::InvalidInput);

        let dep = ClaManagerError::dependency("looking up role ID", "connection refused");
        assert_eq!(dep.kind(), ErrorKind::Dependency);
        assert_eq!(dep.to_string(), "looking up role ID: connection refused");
    }
}
