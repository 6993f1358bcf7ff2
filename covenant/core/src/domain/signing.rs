// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Signing-state oracle.

use async_trait::async_trait;

use super::company::Company;

#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    #[error("signing state lookup failed: {0}")]
    Remote(String),
}

/// Answers "does this (company, project) pair already have a fully
/// executed CCLA" — true when the pair has one or more active CLA
/// managers.
#[async_trait]
pub trait SigningStateOracle: Send + Sync {
    async fn is_signed(&self, company: &Company, project_sfid: &str) -> Result<bool, OracleError>;
}
