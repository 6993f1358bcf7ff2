// Copyright (c) 2026 Covenant Maintainers
// SPDX-License-Identifier: MIT
//! HTTP API for the reconciliation engine.
//!
//! Thin translation layer: request DTOs in, engine call, domain record or
//! `{ "message", "code" }` error body out. All reconciliation semantics
//! live in `crate::application`.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::application::{ClaManagerService, CreateManagerRequest, SignatureEventService};
use crate::domain::error::{ClaManagerError, ErrorKind};
use crate::domain::hierarchy::ProjectHierarchyResolver;
use crate::domain::signature::SignatureStreamRecord;

pub struct AppState {
    pub managers: Arc<ClaManagerService>,
    pub signature_events: Arc<SignatureEventService>,
    pub hierarchy: Arc<dyn ProjectHierarchyResolver>,
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/v4/cla-groups/{cla_group_id}/cla-managers",
            post(create_cla_manager),
        )
        .route(
            "/v4/cla-groups/{cla_group_id}/cla-managers/{user_lfid}",
            delete(delete_cla_manager),
        )
        .route(
            "/v4/companies/{company_sfid}/projects/{project_sfid}/cla-manager-designee",
            post(create_designee),
        )
        .route(
            "/v4/companies/{company_sfid}/cla-manager-designees",
            post(create_designees_by_group),
        )
        .route("/v4/events/signature-signed", post(signature_signed))
        .with_state(state)
}

struct ApiError(ClaManagerError);

impl From<ClaManagerError> for ApiError {
    fn from(err: ClaManagerError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.kind() {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::InvalidInput | ErrorKind::Dependency => StatusCode::BAD_REQUEST,
        };
        let body = json!({
            "message": self.0.to_string(),
            "code": status.as_u16(),
        });
        (status, Json(body)).into_response()
    }
}

#[derive(Deserialize)]
struct CreateManagerBody {
    company_sfid: String,
    project_sfid: String,
    first_name: String,
    last_name: String,
    user_email: String,
    requested_by: String,
}

async fn create_cla_manager(
    State(state): State<Arc<AppState>>,
    Path(cla_group_id): Path<String>,
    Json(body): Json<CreateManagerBody>,
) -> Result<impl IntoResponse, ApiError> {
    let request = CreateManagerRequest {
        company_sfid: body.company_sfid,
        project_sfid: body.project_sfid,
        first_name: body.first_name,
        last_name: body.last_name,
        user_email: body.user_email,
        requested_by: body.requested_by,
    };
    let manager = state.managers.create_manager(&cla_group_id, &request).await?;
    Ok(Json(manager))
}

#[derive(Deserialize)]
struct DeleteManagerQuery {
    company_sfid: String,
}

async fn delete_cla_manager(
    State(state): State<Arc<AppState>>,
    Path((cla_group_id, user_lfid)): Path<(String, String)>,
    Query(query): Query<DeleteManagerQuery>,
) -> Result<impl IntoResponse, ApiError> {
    state
        .managers
        .delete_manager(&cla_group_id, &query.company_sfid, &user_lfid)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
struct CreateDesigneeBody {
    user_email: String,
}

async fn create_designee(
    State(state): State<Arc<AppState>>,
    Path((company_sfid, project_sfid)): Path<(String, String)>,
    Json(body): Json<CreateDesigneeBody>,
) -> Result<impl IntoResponse, ApiError> {
    let designee = state
        .managers
        .create_manager_designee(&company_sfid, &project_sfid, &body.user_email)
        .await?;
    Ok(Json(designee))
}

#[derive(Deserialize)]
struct CreateDesigneesByGroupBody {
    user_email: String,
    cla_group_id: String,
}

async fn create_designees_by_group(
    State(state): State<Arc<AppState>>,
    Path(company_sfid): Path<String>,
    Json(body): Json<CreateDesigneesByGroupBody>,
) -> Result<impl IntoResponse, ApiError> {
    let groups = state
        .hierarchy
        .associated_projects(&body.cla_group_id)
        .await
        .map_err(|e| ClaManagerError::dependency("loading associated projects", e))?;
    // The engine rejects the empty list too; checking here keeps the 400
    // before any owner-role side effect.
    if groups.is_empty() {
        return Err(ClaManagerError::InvalidInput(format!(
            "no projects associated with CLA group {}",
            body.cla_group_id
        ))
        .into());
    }

    let designees = state
        .managers
        .create_manager_designee_by_group(&company_sfid, &body.user_email, &groups)
        .await?;
    Ok(Json(json!({ "list": designees })))
}

async fn signature_signed(
    State(state): State<Arc<AppState>>,
    Json(record): Json<SignatureStreamRecord>,
) -> Result<impl IntoResponse, ApiError> {
    state.signature_events.signature_signed_event(&record).await?;
    Ok(StatusCode::OK)
}
