// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP adapter for the external identity directory.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::identity::{
    AccountType, IdentityAccount, IdentityError, IdentityResolver, OrgAffiliation,
};

pub struct HttpIdentityResolver {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct UserDto {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "FirstName", default)]
    first_name: String,
    #[serde(rename = "LastName", default)]
    last_name: String,
    #[serde(rename = "Emails", default)]
    emails: Vec<EmailDto>,
    #[serde(rename = "Type")]
    account_type: String,
    #[serde(rename = "Account", default)]
    account: Option<AccountDto>,
}

#[derive(Deserialize)]
struct EmailDto {
    #[serde(rename = "EmailAddress")]
    email_address: String,
    #[serde(rename = "IsPrimary", default)]
    is_primary: bool,
}

#[derive(Deserialize)]
struct AccountDto {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Deserialize)]
struct UserListDto {
    #[serde(rename = "Data", default)]
    data: Vec<UserDto>,
}

impl From<UserDto> for IdentityAccount {
    fn from(dto: UserDto) -> Self {
        let mut emails: Vec<String> = dto
            .emails
            .iter()
            .filter(|e| e.is_primary)
            .map(|e| e.email_address.clone())
            .collect();
        emails.extend(
            dto.emails
                .iter()
                .filter(|e| !e.is_primary)
                .map(|e| e.email_address.clone()),
        );
        IdentityAccount {
            id: dto.id,
            username: dto.username,
            first_name: dto.first_name,
            last_name: dto.last_name,
            emails,
            account_type: if dto.account_type.eq_ignore_ascii_case("lead") {
                AccountType::Lead
            } else {
                AccountType::Contact
            },
            account: dto.account.map(|a| OrgAffiliation {
                id: a.id,
                name: a.name,
            }),
        }
    }
}

impl HttpIdentityResolver {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn search(
        &self,
        query_key: &str,
        query_value: &str,
    ) -> Result<Option<IdentityAccount>, IdentityError> {
        let response = self
            .client
            .get(format!("{}/users/search", self.base_url))
            .bearer_auth(&self.token)
            .query(&[(query_key, query_value)])
            .send()
            .await
            .map_err(|e| IdentityError::Remote(e.to_string()))?;

        // 404 from the directory means the query matched nothing.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Remote(format!("HTTP {}: {}", status, body)));
        }

        let list: UserListDto = response
            .json()
            .await
            .map_err(|e| IdentityError::Remote(format!("failed to parse response: {}", e)))?;
        Ok(list.data.into_iter().next().map(IdentityAccount::from))
    }
}

#[async_trait]
impl IdentityResolver for HttpIdentityResolver {
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityAccount>, IdentityError> {
        self.search("email", email).await
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<IdentityAccount>, IdentityError> {
        self.search("username", username).await
    }

    async fn convert_to_contact(&self, user_id: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(format!(
                "{}/users/{}/convert-to-contact",
                self.base_url, user_id
            ))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| IdentityError::Remote(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Remote(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn search_maps_users_and_prefers_primary_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/users/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "email".into(),
                "jane@acme.com".into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"Data":[{
                    "ID":"usr-1","Username":"janedoe",
                    "FirstName":"Jane","LastName":"Doe",
                    "Emails":[
                        {"EmailAddress":"alt@acme.com","IsPrimary":false},
                        {"EmailAddress":"jane@acme.com","IsPrimary":true}
                    ],
                    "Type":"lead",
                    "Account":{"ID":"org-9","Name":"Acme"}
                }]}"#,
            )
            .create_async()
            .await;

        let resolver = HttpIdentityResolver::new(server.url(), "token".into());
        let account = resolver
            .find_by_email("jane@acme.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(account.id, "usr-1");
        assert_eq!(account.primary_email(), Some("jane@acme.com"));
        assert_eq!(account.account_type, AccountType::Lead);
        assert_eq!(account.account.unwrap().name, "Acme");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn directory_404_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "username".into(),
                "ghost".into(),
            ))
            .with_status(404)
            .create_async()
            .await;

        let resolver = HttpIdentityResolver::new(server.url(), "token".into());
        let account = resolver.find_by_username("ghost").await.unwrap();
        assert!(account.is_none());
    }

    #[tokio::test]
    async fn server_error_is_remote() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/users/search")
            .match_query(mockito::Matcher::UrlEncoded(
                "email".into(),
                "jane@acme.com".into(),
            ))
            .with_status(500)
            .with_body("boom")
            .create_async()
            .await;

        let resolver = HttpIdentityResolver::new(server.url(), "token".into());
        let err = resolver.find_by_email("jane@acme.com").await.unwrap_err();
        assert!(err.to_string().contains("HTTP 500"));
    }
}
