// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Audit events emitted to the external event log.
//!
//! Logging an event is fire-and-forget: implementations record delivery
//! failures themselves and never fail the workflow that emitted the event.

use async_trait::async_trait;
use serde::Serialize;

/// Audit events the reconciliation workflows emit.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum AuditEvent {
    AssignUserRoleScope {
        lf_username: String,
        user_sfid: String,
        company_id: String,
        project_sfid: String,
        role: String,
        /// "project_sfid|company_sfid" scope string.
        scope: String,
    },
    ConvertUserToContact {
        lf_username: String,
        project_sfid: String,
    },
    ContributorAssignDesignee {
        lf_username: String,
        company_id: String,
        project_sfid: String,
        designee_name: String,
        designee_email: String,
    },
    ContributorNotifyDesignee {
        lf_username: String,
        company_id: String,
        project_sfid: String,
        designee_name: String,
        designee_email: String,
    },
    ContributorNotifyCompanyAdmin {
        lf_username: String,
        company_id: String,
        project_sfid: String,
        admin_name: String,
        admin_email: String,
    },
}

#[async_trait]
pub trait EventLog: Send + Sync {
    async fn log(&self, event: AuditEvent);
}
