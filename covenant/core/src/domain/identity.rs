// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! External identity directory interface.
//!
//! Anti-corruption layer over the identity service: the engine never sees
//! the directory's wire shapes, only [`IdentityAccount`]. Absence of an
//! account is `Ok(None)`, never an error — the invitation flow branches on
//! that signal.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Account name used by the directory for users without a company.
pub const NO_ACCOUNT: &str = "Individual - No Account";

/// Account maturity in the external directory. Leads must be promoted to
/// contacts before holding durable roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Lead,
    Contact,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lead => "lead",
            Self::Contact => "contact",
        }
    }
}

/// Organization the account is affiliated with, as known to the directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgAffiliation {
    pub id: String,
    pub name: String,
}

/// A resolved account in the external identity directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityAccount {
    /// Opaque subject identifier (user SFID).
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub emails: Vec<String>,
    pub account_type: AccountType,
    /// Directory-side company affiliation, if any.
    #[serde(default)]
    pub account: Option<OrgAffiliation>,
}

impl IdentityAccount {
    pub fn primary_email(&self) -> Option<&str> {
        self.emails.first().map(String::as_str)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    /// True when the directory has no real company affiliation on record.
    pub fn has_no_account(&self) -> bool {
        match &self.account {
            Some(org) => org.name == NO_ACCOUNT,
            None => true,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity directory request failed: {0}")]
    Remote(String),
}

/// Locates accounts in the external identity directory and promotes
/// provisional leads to full contacts.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Find the account for an email address. `None` means the email has
    /// no account in the directory.
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityAccount>, IdentityError>;

    /// Find the account for a directory username.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<IdentityAccount>, IdentityError>;

    /// Convert a provisional lead account into a full contact record.
    async fn convert_to_contact(&self, user_id: &str) -> Result<(), IdentityError>;
}
