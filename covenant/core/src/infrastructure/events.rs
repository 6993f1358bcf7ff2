// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP event log adapter. Delivery failures are logged and swallowed; an
//! audit gap never fails the workflow that emitted the event.

use async_trait::async_trait;
use tracing::warn;

use crate::domain::events::{AuditEvent, EventLog};

pub struct HttpEventLog {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpEventLog {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }
}

#[async_trait]
impl EventLog for HttpEventLog {
    async fn log(&self, event: AuditEvent) {
        let result = self
            .client
            .post(format!("{}/events", self.base_url))
            .bearer_auth(&self.token)
            .json(&event)
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                warn!(status = %response.status(), ?event, "event log rejected audit event");
            }
            Err(e) => {
                warn!(error = %e, ?event, "failed to deliver audit event");
            }
            Ok(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn posts_tagged_event_payload() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/events")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "event_type": "assign_user_role_scope",
                "lf_username": "janedoe",
                "scope": "proj-42|SFDC-1"
            })))
            .with_status(200)
            .create_async()
            .await;

        let log = HttpEventLog::new(server.url(), "token".into());
        log.log(AuditEvent::AssignUserRoleScope {
            lf_username: "janedoe".into(),
            user_sfid: "usr-1".into(),
            company_id: "comp-1".into(),
            project_sfid: "proj-42".into(),
            role: "cla-manager-designee".into(),
            scope: "proj-42|SFDC-1".into(),
        })
        .await;
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn delivery_failure_is_swallowed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/events")
            .with_status(500)
            .create_async()
            .await;

        let log = HttpEventLog::new(server.url(), "token".into());
        // Must not panic or surface the failure.
        log.log(AuditEvent::ConvertUserToContact {
            lf_username: "janedoe".into(),
            project_sfid: "proj-42".into(),
        })
        .await;
    }
}
