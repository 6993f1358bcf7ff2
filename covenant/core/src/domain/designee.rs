// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Ephemeral results of manager assignment.
//!
//! Neither type is persisted: both are constructed per assignment and
//! returned to the caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identity::AccountType;

/// "This identity has been granted (or is pending) the
/// cla-manager-designee role scope for this (company, project) pair."
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaManagerDesignee {
    pub lf_username: String,
    /// External subject identifier of the designee.
    pub user_sfid: String,
    pub account_type: AccountType,
    pub assigned_on: DateTime<Utc>,
    pub email: String,
    pub company_sfid: String,
    pub project_sfid: String,
    pub project_name: String,
}

/// Composite result of promoting a request directly to a signed CLA
/// manager (the original-signer flow).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompanyClaManager {
    pub lf_username: String,
    pub name: String,
    pub email: String,
    pub user_sfid: String,
    pub approved_on: DateTime<Utc>,
    pub cla_group_id: String,
    pub cla_group_name: String,
    pub project_sfid: String,
    pub project_name: String,
    pub organization_name: String,
    pub organization_sfid: String,
}
