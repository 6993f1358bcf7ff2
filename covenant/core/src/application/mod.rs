// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Application layer: the designee reconciliation engine and the
//! signature change reaction.

pub mod cla_manager;
pub mod signature_events;

pub use cla_manager::{ClaManagerService, CreateManagerRequest, ManagerContact, Requester};
pub use signature_events::SignatureEventService;
