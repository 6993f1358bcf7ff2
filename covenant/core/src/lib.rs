// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Covenant core
//!
//! Domain model, reconciliation engine, external service adapters and HTTP
//! presentation for the Covenant CLA manager service.
//!
//! # Architecture
//!
//! - **domain** — entities, capability traits and the error taxonomy
//! - **application** — the designee reconciliation engine and the
//!   signature change reaction
//! - **infrastructure** — reqwest adapters and in-memory implementations
//! - **presentation** — axum routes and the change-stream webhook

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
