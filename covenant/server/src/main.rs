// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! # Covenant service daemon
//!
//! Wires the HTTP adapters for the external platform services into the
//! reconciliation engine and serves the v4 API.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use covenant_core::application::{ClaManagerService, SignatureEventService};
use covenant_core::infrastructure::memory::{
    InMemoryClaUserRepository, InMemoryCompanyRepository, InMemorySignatureRepository,
};
use covenant_core::infrastructure::{
    HttpEventLog, HttpIdentityResolver, HttpNotificationDispatcher, HttpProjectHierarchyResolver,
    HttpRoleCatalog, HttpScopeLedger, HttpSigningStateOracle,
};
use covenant_core::presentation::{app, AppState};

mod config;

use config::ServiceConfig;

/// Covenant - CLA manager assignment and role-scope reconciliation
#[derive(Parser)]
#[command(name = "covenant")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "COVENANT_CONFIG_PATH",
        value_name = "FILE",
        default_value = "covenant.yaml"
    )]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "COVENANT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(cli.log_level.clone())),
        )
        .init();

    let config = ServiceConfig::load(&cli.config)?;
    let token = std::env::var("COVENANT_PLATFORM_TOKEN")
        .context("COVENANT_PLATFORM_TOKEN is not set")?;

    let state = build_state(&config, token);

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("binding {}", config.bind_addr()))?;
    info!(addr = %config.bind_addr(), "covenant listening");

    axum::serve(listener, app(state))
        .await
        .context("serving HTTP API")?;
    Ok(())
}

/// Assembles the engine from the configured platform adapters.
///
/// The company, CLA-user and signature stores are wired to the empty
/// in-memory implementations: the persistent store adapters are not
/// built yet, so a fresh daemon serves an empty internal dataset until
/// they land. Operations that only touch the external platform services
/// are fully functional.
fn build_state(config: &ServiceConfig, token: String) -> Arc<AppState> {
    let platform = &config.platform;

    let companies = Arc::new(InMemoryCompanyRepository::default());
    let cla_users = Arc::new(InMemoryClaUserRepository::default());
    let signatures = Arc::new(InMemorySignatureRepository::default());

    let identity = Arc::new(HttpIdentityResolver::new(
        platform.identity_url.clone(),
        token.clone(),
    ));
    let ledger = Arc::new(HttpScopeLedger::new(
        platform.organization_url.clone(),
        token.clone(),
    ));
    let catalog = Arc::new(HttpRoleCatalog::new(
        platform.role_catalog_url.clone(),
        token.clone(),
    ));
    let hierarchy = Arc::new(HttpProjectHierarchyResolver::new(
        platform.project_url.clone(),
        token.clone(),
    ));
    let oracle = Arc::new(HttpSigningStateOracle::new(
        platform.signature_url.clone(),
        token.clone(),
    ));
    let events = Arc::new(HttpEventLog::new(platform.events_url.clone(), token.clone()));
    let notifier = Arc::new(HttpNotificationDispatcher::new(
        platform.notifications_url.clone(),
        token,
    ));

    let managers = Arc::new(ClaManagerService::new(
        companies.clone(),
        cla_users.clone(),
        signatures.clone(),
        identity.clone(),
        ledger.clone(),
        catalog.clone(),
        hierarchy.clone(),
        oracle,
        events,
        notifier,
    ));
    let signature_events = Arc::new(SignatureEventService::new(
        companies,
        signatures,
        identity,
        ledger,
        catalog,
        hierarchy.clone(),
    ));

    Arc::new(AppState {
        managers,
        signature_events,
        hierarchy,
    })
}
