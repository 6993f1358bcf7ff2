// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Domain layer: entities, capability interfaces and the error taxonomy.
//!
//! Capability traits are defined here and implemented in
//! `crate::infrastructure`; the engine only ever sees `Arc<dyn Trait>`
//! handles.

pub mod company;
pub mod designee;
pub mod error;
pub mod events;
pub mod hierarchy;
pub mod identity;
pub mod notification;
pub mod repository;
pub mod roles;
pub mod scope;
pub mod signature;
pub mod signing;
