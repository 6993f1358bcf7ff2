// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Service configuration.
//!
//! Loaded from a YAML file; the platform API token comes from the
//! `COVENANT_PLATFORM_TOKEN` environment variable (a `.env` file is
//! honored) so credentials stay out of config files.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub platform: PlatformConfig,
}

/// Base URLs of the external platform services.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
    pub identity_url: String,
    pub organization_url: String,
    pub role_catalog_url: String,
    pub project_url: String,
    pub signature_url: String,
    pub events_url: String,
    pub notifications_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

impl ServiceConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&raw)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
