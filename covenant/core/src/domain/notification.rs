// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! Outbound notification contracts.
//!
//! The dispatcher consumes semantic payloads; content formatting and
//! delivery are the external collaborator's problem. Everything except the
//! no-account invitation is fire-and-forget.

use async_trait::async_trait;
use serde::Serialize;

/// Invitation for an email address with no directory account, asking the
/// recipient to create one so the requester can finish assigning the role.
#[derive(Debug, Clone, Serialize)]
pub struct NoAccountInvite {
    pub recipient_name: String,
    pub recipient_email: String,
    pub project_name: String,
    pub requester_username: String,
    pub requester_email: String,
    pub organization_id: String,
    pub project_sfid: Option<String>,
    pub role_name: String,
}

/// Notification to a newly assigned designee.
#[derive(Debug, Clone, Serialize)]
pub struct DesigneeNotification {
    pub designee_name: String,
    pub designee_email: String,
    pub company_name: String,
    pub project_names: Vec<String>,
    pub requester_username: String,
    pub requester_email: String,
}

/// Notification to a company admin that a contributor needs a CLA signed.
#[derive(Debug, Clone, Serialize)]
pub struct AdminNotification {
    pub admin_name: String,
    pub admin_email: String,
    pub company_name: String,
    pub project_names: Vec<String>,
    pub contributor_username: String,
    pub contributor_email: String,
}

/// Approval-request notification to an existing CLA manager.
#[derive(Debug, Clone, Serialize)]
pub struct ManagerNotification {
    pub manager_name: String,
    pub manager_email: String,
    pub contributor_username: String,
    pub contributor_email: String,
    pub company_name: String,
    pub cla_group_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification dispatch failed: {0}")]
    Dispatch(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// The one fallible dispatch: the invitation is part of the
    /// no-account contract and its failure is surfaced to the caller.
    async fn invite_user_without_account(
        &self,
        invite: &NoAccountInvite,
    ) -> Result<(), NotifyError>;

    async fn notify_designee(&self, notification: &DesigneeNotification);

    async fn notify_company_admin(&self, notification: &AdminNotification);

    async fn notify_cla_manager(&self, notification: &ManagerNotification);
}
