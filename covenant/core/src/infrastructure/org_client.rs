// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP adapter for the external authorization (scope ledger) service.
//!
//! The ledger contract normalizes remote 404s: existence checks become
//! `false`, list calls become empty, scope-ID resolution becomes `None`.
//! Only the atomic create surfaces 409 as [`LedgerError::Conflict`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::roles::{RoleId, ScopePath};
use crate::domain::scope::{AdminScope, LedgerError, ScopeLedger};

pub struct HttpScopeLedger {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Serialize)]
struct CreateScopeRequest<'a> {
    email: &'a str,
    role_id: &'a str,
    object_type: &'a str,
    object_id: String,
}

#[derive(Deserialize)]
struct ScopeListDto {
    #[serde(default)]
    userroles: Vec<UserRoleDto>,
}

#[derive(Deserialize)]
struct UserRoleDto {
    #[serde(default)]
    contact: ContactDto,
    #[serde(default)]
    roles: Vec<RoleScopeDto>,
}

#[derive(Deserialize, Default)]
struct ContactDto {
    #[serde(default)]
    username: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    email_address: String,
}

#[derive(Deserialize)]
struct RoleScopeDto {
    #[serde(default)]
    role_name: String,
    #[serde(default)]
    scopes: Vec<ScopeDto>,
}

#[derive(Deserialize)]
struct ScopeDto {
    scope_id: String,
    /// "project|organization" composite or a bare organization ID.
    #[serde(default)]
    object_id: String,
    #[serde(default)]
    object_type: String,
}

impl HttpScopeLedger {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    /// Fetch the role scopes of one organization. 404 is an empty listing.
    async fn fetch_scopes(
        &self,
        company_sfid: &str,
        role_filter: Option<&str>,
    ) -> Result<Vec<UserRoleDto>, LedgerError> {
        let mut request = self
            .client
            .get(format!(
                "{}/orgs/{}/user-role-scopes",
                self.base_url, company_sfid
            ))
            .bearer_auth(&self.token);
        if let Some(role) = role_filter {
            request = request.query(&[("rolename", role)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LedgerError::Remote(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {}", status, body)));
        }

        let list: ScopeListDto = response
            .json()
            .await
            .map_err(|e| LedgerError::Remote(format!("failed to parse response: {}", e)))?;
        Ok(list.userroles)
    }
}

#[async_trait]
impl ScopeLedger for HttpScopeLedger {
    async fn has_role_scope(
        &self,
        role: &str,
        user_id: &str,
        company_sfid: &str,
        project_sfid: &str,
    ) -> Result<bool, LedgerError> {
        let response = self
            .client
            .get(format!(
                "{}/orgs/{}/users/{}/roles/{}",
                self.base_url, company_sfid, user_id, role
            ))
            .bearer_auth(&self.token)
            .query(&[("objectid", format!("{project_sfid}|{company_sfid}"))])
            .send()
            .await
            .map_err(|e| LedgerError::Remote(e.to_string()))?;

        // No such scope is a negative answer, not a failure.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {}", status, body)));
        }
        Ok(true)
    }

    async fn create_scope(
        &self,
        email: &str,
        role_id: &RoleId,
        company_sfid: &str,
        project_sfid: Option<&str>,
    ) -> Result<(), LedgerError> {
        let (object_type, object_id) = match project_sfid {
            Some(project) => (
                ScopePath::ProjectOrganization.as_str(),
                format!("{project}|{company_sfid}"),
            ),
            None => (ScopePath::Organization.as_str(), company_sfid.to_string()),
        };
        let body = CreateScopeRequest {
            email,
            role_id: role_id.as_str(),
            object_type,
            object_id,
        };

        let response = self
            .client
            .post(format!(
                "{}/orgs/{}/role-scopes",
                self.base_url, company_sfid
            ))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| LedgerError::Remote(e.to_string()))?;

        if response.status() == reqwest::StatusCode::CONFLICT {
            return Err(LedgerError::Conflict);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }

    async fn delete_scope(
        &self,
        company_sfid: &str,
        role_id: &RoleId,
        scope_id: &str,
        username: &str,
        email: &str,
    ) -> Result<(), LedgerError> {
        let response = self
            .client
            .delete(format!(
                "{}/orgs/{}/roles/{}/scopes/{}",
                self.base_url,
                company_sfid,
                role_id.as_str(),
                scope_id
            ))
            .bearer_auth(&self.token)
            .query(&[("username", username), ("email", email)])
            .send()
            .await
            .map_err(|e| LedgerError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }

    async fn resolve_scope_id(
        &self,
        company_sfid: &str,
        project_sfid: &str,
        role: &str,
        scope_path: ScopePath,
        username: &str,
    ) -> Result<Option<String>, LedgerError> {
        let wanted_object_id = match scope_path {
            ScopePath::Organization => company_sfid.to_string(),
            ScopePath::ProjectOrganization => format!("{project_sfid}|{company_sfid}"),
        };

        let holders = self.fetch_scopes(company_sfid, Some(role)).await?;
        for holder in &holders {
            if holder.contact.username != username {
                continue;
            }
            for role_entry in &holder.roles {
                if role_entry.role_name != role {
                    continue;
                }
                for scope in &role_entry.scopes {
                    if scope.object_type == scope_path.as_str()
                        && scope.object_id == wanted_object_id
                    {
                        return Ok(Some(scope.scope_id.clone()));
                    }
                }
            }
        }
        Ok(None)
    }

    async fn list_admin_scopes(
        &self,
        company_sfid: &str,
        role_filter: Option<&str>,
    ) -> Result<Vec<AdminScope>, LedgerError> {
        let holders = self.fetch_scopes(company_sfid, role_filter).await?;
        Ok(holders
            .into_iter()
            .map(|h| AdminScope {
                username: h.contact.username,
                name: h.contact.name,
                email: h.contact.email_address,
            })
            .collect())
    }

    async fn is_company_owner(&self, user_id: &str, org_id: &str) -> Result<bool, LedgerError> {
        let response = self
            .client
            .get(format!(
                "{}/orgs/{}/owners/{}",
                self.base_url, org_id, user_id
            ))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| LedgerError::Remote(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::Remote(format!("HTTP {}: {}", status, body)));
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn existence_check_404_is_false() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/orgs/SFDC-1/users/usr-1/roles/cla-manager-designee")
            .match_query(mockito::Matcher::UrlEncoded(
                "objectid".into(),
                "proj-42|SFDC-1".into(),
            ))
            .with_status(404)
            .create_async()
            .await;

        let ledger = HttpScopeLedger::new(server.url(), "token".into());
        let has = ledger
            .has_role_scope("cla-manager-designee", "usr-1", "SFDC-1", "proj-42")
            .await
            .unwrap();
        assert!(!has);
    }

    #[tokio::test]
    async fn create_scope_409_is_conflict() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/orgs/SFDC-1/role-scopes")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "email": "jane@acme.com",
                "role_id": "role-1",
                "object_type": "project|organization",
                "object_id": "proj-42|SFDC-1"
            })))
            .with_status(409)
            .create_async()
            .await;

        let ledger = HttpScopeLedger::new(server.url(), "token".into());
        let err = ledger
            .create_scope(
                "jane@acme.com",
                &RoleId("role-1".into()),
                "SFDC-1",
                Some("proj-42"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::Conflict));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn org_scope_create_sends_bare_org_object() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/orgs/SFDC-1/role-scopes")
            .match_body(mockito::Matcher::PartialJson(serde_json::json!({
                "object_type": "organization",
                "object_id": "SFDC-1"
            })))
            .with_status(201)
            .create_async()
            .await;

        let ledger = HttpScopeLedger::new(server.url(), "token".into());
        ledger
            .create_scope("jane@acme.com", &RoleId("role-2".into()), "SFDC-1", None)
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn resolve_scope_id_matches_holder_and_object() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/orgs/SFDC-1/user-role-scopes")
            .match_query(mockito::Matcher::UrlEncoded(
                "rolename".into(),
                "cla-manager".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"userroles":[{
                    "contact":{"username":"janedoe","name":"Jane Doe","email_address":"jane@acme.com"},
                    "roles":[{"role_name":"cla-manager","scopes":[
                        {"scope_id":"scope-7","object_id":"proj-42|SFDC-1","object_type":"project|organization"},
                        {"scope_id":"scope-8","object_id":"proj-43|SFDC-1","object_type":"project|organization"}
                    ]}]
                }]}"#,
            )
            .create_async()
            .await;

        let ledger = HttpScopeLedger::new(server.url(), "token".into());
        let scope_id = ledger
            .resolve_scope_id(
                "SFDC-1",
                "proj-42",
                "cla-manager",
                ScopePath::ProjectOrganization,
                "janedoe",
            )
            .await
            .unwrap();
        assert_eq!(scope_id.as_deref(), Some("scope-7"));

        let missing = ledger
            .resolve_scope_id(
                "SFDC-1",
                "proj-99",
                "cla-manager",
                ScopePath::ProjectOrganization,
                "janedoe",
            )
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn list_admin_scopes_404_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/orgs/SFDC-9/user-role-scopes")
            .with_status(404)
            .create_async()
            .await;

        let ledger = HttpScopeLedger::new(server.url(), "token".into());
        let admins = ledger.list_admin_scopes("SFDC-9", None).await.unwrap();
        assert!(admins.is_empty());
    }
}
