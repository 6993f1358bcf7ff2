// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Persistence contracts.
//!
//! One trait per aggregate, defined here and implemented in
//! `crate::infrastructure`. The engine owns no persistent state itself;
//! these are the internal stores it reads and writes through.

use async_trait::async_trait;

use super::company::{ClaUser, Company};
use super::signature::Signature;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(String),
}

/// Internal company store.
#[async_trait]
pub trait CompanyRepository: Send + Sync {
    /// Lookup by external organization ID. `None` when no company has
    /// been joined against that ID.
    async fn find_by_external_id(
        &self,
        company_sfid: &str,
    ) -> Result<Option<Company>, RepositoryError>;

    async fn find_by_id(&self, company_id: &str) -> Result<Option<Company>, RepositoryError>;
}

/// Internal CLA user store, keyed by external directory username.
#[async_trait]
pub trait ClaUserRepository: Send + Sync {
    async fn find_by_username(&self, lf_username: &str)
        -> Result<Option<ClaUser>, RepositoryError>;

    async fn find_by_id(&self, user_id: &str) -> Result<Option<ClaUser>, RepositoryError>;

    /// Idempotent upsert keyed by `lf_username`.
    async fn save(&self, user: &ClaUser) -> Result<(), RepositoryError>;
}

/// External signature store. The manager ACL lives on the corporate
/// signature record.
#[async_trait]
pub trait SignatureRepository: Send + Sync {
    /// Add a manager to the corporate signature ACL for (company, CLA
    /// group). `None` when no corporate signature exists for the pair.
    async fn add_cla_manager(
        &self,
        company_id: &str,
        cla_group_id: &str,
        lf_username: &str,
    ) -> Result<Option<Signature>, RepositoryError>;

    /// Remove a manager from the corporate signature ACL. `None` when no
    /// corporate signature exists for the pair.
    async fn remove_cla_manager(
        &self,
        company_id: &str,
        cla_group_id: &str,
        lf_username: &str,
    ) -> Result<Option<Signature>, RepositoryError>;

    /// Stamp the signed-on timestamp of a signature.
    async fn add_signed_on(&self, signature_id: &str) -> Result<(), RepositoryError>;
}
