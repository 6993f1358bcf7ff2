// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Presentation layer: HTTP API.

pub mod api;

pub use api::{app, AppState};
