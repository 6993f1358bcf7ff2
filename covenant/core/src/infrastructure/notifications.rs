// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP notification dispatcher.
//!
//! The invitation endpoint is fallible per the domain contract; the three
//! courtesy notifications are fire-and-forget and only warn on failure.

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::domain::notification::{
    AdminNotification, DesigneeNotification, ManagerNotification, NoAccountInvite,
    NotificationDispatcher, NotifyError,
};

pub struct HttpNotificationDispatcher {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpNotificationDispatcher {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn post_best_effort<T: Serialize + std::fmt::Debug>(&self, path: &str, payload: &T) {
        let result = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), %path, ?payload,
                      "notification endpoint rejected payload");
            }
            Err(e) => {
                warn!(error = %e, %path, ?payload, "failed to dispatch notification");
            }
            Ok(_) => {}
        }
    }
}

#[async_trait]
impl NotificationDispatcher for HttpNotificationDispatcher {
    async fn invite_user_without_account(
        &self,
        invite: &NoAccountInvite,
    ) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(format!("{}/invites", self.base_url))
            .bearer_auth(&self.token)
            .json(invite)
            .send()
            .await
            .map_err(|e| NotifyError::Dispatch(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifyError::Dispatch(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }

    async fn notify_designee(&self, notification: &DesigneeNotification) {
        self.post_best_effort("/notifications/designee", notification)
            .await;
    }

    async fn notify_company_admin(&self, notification: &AdminNotification) {
        self.post_best_effort("/notifications/company-admin", notification)
            .await;
    }

    async fn notify_cla_manager(&self, notification: &ManagerNotification) {
        self.post_best_effort("/notifications/cla-manager", notification)
            .await;
    }
}
