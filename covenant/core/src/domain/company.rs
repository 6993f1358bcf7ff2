// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Internal company, CLA group and association records.

use serde::{Deserialize, Serialize};

/// Internal company record.
///
/// A company with a non-empty `external_id` corresponds to exactly one
/// organization in the external directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub company_id: String,

    /// External organization identifier (SFID). Empty for companies that
    /// have not been joined against the external directory yet.
    #[serde(default)]
    pub external_id: Option<String>,

    pub name: String,
}

impl Company {
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Logical agreement grouping. Signing level is derived from signature
/// records, never stored here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaGroup {
    pub cla_group_id: String,
    pub name: String,
}

/// Maps one external project to the CLA group it is signed against.
/// Many projects may map to one CLA group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectClaGroup {
    pub project_sfid: String,
    pub cla_group_id: String,
    pub foundation_sfid: String,
    #[serde(default)]
    pub project_name: String,
}

/// Internal CLA user record, keyed by the external directory username.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaUser {
    pub user_id: String,
    pub lf_username: String,
    pub lf_email: String,
    /// Display name ("First Last").
    pub username: String,
    /// External company the user was created under.
    pub external_id: String,
    pub admin: bool,
    pub date_created: chrono::DateTime<chrono::Utc>,
    pub date_modified: chrono::DateTime<chrono::Utc>,
}
