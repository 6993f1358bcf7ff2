// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP adapter for the project hierarchy service.

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::company::{ClaGroup, ProjectClaGroup};
use crate::domain::hierarchy::{HierarchyError, ProjectHierarchyResolver, ProjectSummary};

pub struct HttpProjectHierarchyResolver {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

#[derive(Deserialize)]
struct ProjectDto {
    #[serde(rename = "ID")]
    id: String,
    #[serde(rename = "Name")]
    name: String,
}

#[derive(Deserialize)]
struct ClaGroupDto {
    cla_group_id: String,
    cla_group_name: String,
}

#[derive(Deserialize)]
struct AssociationListDto {
    #[serde(default)]
    list: Vec<AssociationDto>,
}

#[derive(Deserialize)]
struct AssociationDto {
    project_sfid: String,
    cla_group_id: String,
    #[serde(default)]
    foundation_sfid: String,
    #[serde(default)]
    project_name: String,
}

#[derive(Deserialize)]
struct SigningLevelDto {
    signed_at_foundation_level: bool,
}

impl HttpProjectHierarchyResolver {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        }
    }

    async fn get_optional<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
    ) -> Result<Option<T>, HierarchyError> {
        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| HierarchyError::Remote(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(HierarchyError::Remote(format!("HTTP {}: {}", status, body)));
        }
        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| HierarchyError::Remote(format!("failed to parse response: {}", e)))
    }
}

#[async_trait]
impl ProjectHierarchyResolver for HttpProjectHierarchyResolver {
    async fn project(&self, project_sfid: &str) -> Result<Option<ProjectSummary>, HierarchyError> {
        let dto: Option<ProjectDto> = self
            .get_optional(format!("{}/projects/{}", self.base_url, project_sfid))
            .await?;
        Ok(dto.map(|p| ProjectSummary {
            sfid: p.id,
            name: p.name,
        }))
    }

    async fn cla_group(&self, cla_group_id: &str) -> Result<Option<ClaGroup>, HierarchyError> {
        let dto: Option<ClaGroupDto> = self
            .get_optional(format!("{}/cla-groups/{}", self.base_url, cla_group_id))
            .await?;
        Ok(dto.map(|g| ClaGroup {
            cla_group_id: g.cla_group_id,
            name: g.cla_group_name,
        }))
    }

    async fn associated_projects(
        &self,
        cla_group_id: &str,
    ) -> Result<Vec<ProjectClaGroup>, HierarchyError> {
        let dto: Option<AssociationListDto> = self
            .get_optional(format!(
                "{}/cla-groups/{}/projects",
                self.base_url, cla_group_id
            ))
            .await?;
        // An unknown group has no associations.
        Ok(dto
            .map(|l| {
                l.list
                    .into_iter()
                    .map(|a| ProjectClaGroup {
                        project_sfid: a.project_sfid,
                        cla_group_id: a.cla_group_id,
                        foundation_sfid: a.foundation_sfid,
                        project_name: a.project_name,
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn signed_at_foundation_level(
        &self,
        cla_group_id: &str,
    ) -> Result<bool, HierarchyError> {
        let dto: Option<SigningLevelDto> = self
            .get_optional(format!(
                "{}/cla-groups/{}/signing-level",
                self.base_url, cla_group_id
            ))
            .await?;
        Ok(dto.map(|d| d.signed_at_foundation_level).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_project_is_none() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/projects/proj-99")
            .with_status(404)
            .create_async()
            .await;

        let resolver = HttpProjectHierarchyResolver::new(server.url(), "token".into());
        assert!(resolver.project("proj-99").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn lists_group_associations() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/cla-groups/cg-9/projects")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"list":[
                    {"project_sfid":"proj-42","cla_group_id":"cg-9","foundation_sfid":"found-1","project_name":"Project A"},
                    {"project_sfid":"proj-43","cla_group_id":"cg-9","foundation_sfid":"found-1"}
                ]}"#,
            )
            .create_async()
            .await;

        let resolver = HttpProjectHierarchyResolver::new(server.url(), "token".into());
        let groups = resolver.associated_projects("cg-9").await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].project_sfid, "proj-42");
        assert_eq!(groups[1].foundation_sfid, "found-1");
        assert!(groups[1].project_name.is_empty());
    }
}
