// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP adapter for the role catalog service.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::roles::{CatalogError, RoleCatalog, RoleId};

pub struct HttpRoleCatalog {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct RoleListDto {
    #[serde(default)]
    data: Vec<RoleDto>,
}

#[derive(Deserialize)]
struct RoleDto {
    role_id: String,
    role_name: String,
}

impl HttpRoleCatalog {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl RoleCatalog for HttpRoleCatalog {
    async fn role_id(&self, role_name: &str) -> Result<RoleId, CatalogError> {
        let response = self
            .client
            .get(format!("{}/roles", self.base_url))
            .bearer_auth(&self.token)
            .query(&[("search", role_name)])
            .send()
            .await
            .map_err(|e| CatalogError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(CatalogError::Remote(format!("HTTP {}: {}", status, body)));
        }

        let list: RoleListDto = response
            .json()
            .await
            .map_err(|e| CatalogError::Remote(format!("failed to parse response: {}", e)))?;

        // The search endpoint matches substrings; require the exact name.
        list.data
            .into_iter()
            .find(|r| r.role_name == role_name)
            .map(|r| RoleId(r.role_id))
            .ok_or_else(|| CatalogError::UnknownRole(role_name.to_string()))
    }
}
