// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP adapter answering "has this company already signed for this
//! project". Backed by the signature query service; 404 means no active
//! corporate signature exists.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::company::Company;
use crate::domain::signing::{OracleError, SigningStateOracle};

pub struct HttpSigningStateOracle {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ActiveSignatureDto {
    #[serde(default)]
    signature_signed: bool,
    #[serde(default)]
    signature_approved: bool,
}

impl HttpSigningStateOracle {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl SigningStateOracle for HttpSigningStateOracle {
    async fn is_signed(&self, company: &Company, project_sfid: &str) -> Result<bool, OracleError> {
        let response = self
            .client
            .get(format!(
                "{}/signatures/project/{}/company/{}/active",
                self.base_url, project_sfid, company.company_id
            ))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| OracleError::Remote(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Remote(format!("HTTP {}: {}", status, body)));
        }

        let dto: ActiveSignatureDto = response
            .json()
            .await
            .map_err(|e| OracleError::Remote(format!("failed to parse response: {}", e)))?;
        Ok(dto.signature_signed && dto.signature_approved)
    }
}
