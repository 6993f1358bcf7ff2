// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Infrastructure layer: HTTP adapters for the external platform services
//! and in-memory implementations of the internal stores.
//!
//! Each adapter is an anti-corruption layer: wire DTOs stay private to the
//! adapter and remote 404s on existence/list queries are normalized into
//! the negative answers the domain contracts promise.

pub mod acs_client;
pub mod company_client;
pub mod events;
pub mod identity_client;
pub mod memory;
pub mod notifications;
pub mod org_client;
pub mod project_client;

pub use acs_client::HttpRoleCatalog;
pub use company_client::HttpSigningStateOracle;
pub use events::HttpEventLog;
pub use identity_client::HttpIdentityResolver;
pub use notifications::HttpNotificationDispatcher;
pub use org_client::HttpScopeLedger;
pub use project_client::HttpProjectHierarchyResolver;
