// src/http/api.rs

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::{ApiSpec, NewAssociation, Project, ProjectVersion, SpecSummary, VersionAssociation};
use crate::merge::{self, list_endpoints};

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct ProjectPayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct SpecPayload {
    pub name: String,
    pub yaml: String,
}

#[derive(Debug, Deserialize)]
pub struct VersionPayload {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AssociationsPayload {
    /// Absent associations mean "clear the version".
    pub associations: Option<Vec<NewAssociation>>,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "timestamp": Utc::now().to_rfc3339() }))
}

/// GET /api/projects
pub async fn list_projects(State(state): State<AppState>) -> Result<Json<Vec<Project>>, ApiError> {
    Ok(Json(state.store.list_projects().await?))
}

/// POST /api/projects
pub async fn create_project(
    State(state): State<AppState>,
    Json(payload): Json<ProjectPayload>,
) -> Result<(StatusCode, Json<Project>), ApiError> {
    let project = state.store.create_project(payload.name).await?;
    tracing::info!(id = project.id, name = %project.name, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// PUT /api/projects/:id
pub async fn update_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<ProjectPayload>,
) -> Result<Json<Project>, ApiError> {
    match state.store.rename_project(id, payload.name).await? {
        Some(project) => Ok(Json(project)),
        None => Err(ApiError::NotFound("project not found".to_string())),
    }
}

/// DELETE /api/projects/:id
pub async fn delete_project(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_project(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/specs
pub async fn list_specs(
    State(state): State<AppState>,
) -> Result<Json<Vec<SpecSummary>>, ApiError> {
    Ok(Json(state.store.list_specs().await?))
}

/// GET /api/specs/:id
pub async fn get_spec(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ApiSpec>, ApiError> {
    match state.store.get_spec(id).await? {
        Some(spec) => Ok(Json(spec)),
        None => Err(ApiError::NotFound("spec not found".to_string())),
    }
}

/// POST /api/specs
pub async fn create_spec(
    State(state): State<AppState>,
    Json(payload): Json<SpecPayload>,
) -> Result<(StatusCode, Json<ApiSpec>), ApiError> {
    let spec = state.store.create_spec(payload.name, payload.yaml).await?;
    tracing::info!(id = spec.id, name = %spec.name, "spec stored");
    Ok((StatusCode::CREATED, Json(spec)))
}

/// PUT /api/specs/:id
pub async fn update_spec(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(payload): Json<SpecPayload>,
) -> Result<Json<ApiSpec>, ApiError> {
    match state.store.update_spec(id, payload.name, payload.yaml).await? {
        Some(spec) => Ok(Json(spec)),
        None => Err(ApiError::NotFound("spec not found".to_string())),
    }
}

/// DELETE /api/specs/:id
pub async fn delete_spec(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_spec(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/specs/:id/endpoints
///
/// Lists the operations of a stored document so clients can pick which
/// ones to associate with a version.
pub async fn spec_endpoints(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, ApiError> {
    let spec = state
        .store
        .get_spec(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("spec not found".to_string()))?;
    let document = merge::parse_document(&spec.yaml).map_err(ApiError::SpecUnreadable)?;
    Ok(Json(json!({ "endpoints": list_endpoints(&document) })))
}

/// GET /api/projects/:id/versions
pub async fn list_versions(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
) -> Result<Json<Vec<ProjectVersion>>, ApiError> {
    Ok(Json(state.store.list_versions(project_id).await?))
}

/// POST /api/projects/:id/versions
pub async fn create_version(
    State(state): State<AppState>,
    Path(project_id): Path<i64>,
    Json(payload): Json<VersionPayload>,
) -> Result<(StatusCode, Json<ProjectVersion>), ApiError> {
    let version = state.store.create_version(project_id, payload.name).await?;
    Ok((StatusCode::CREATED, Json(version)))
}

/// DELETE /api/versions/:id
pub async fn delete_version(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.store.delete_version(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/versions/:id/associations
pub async fn list_associations(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
) -> Result<Json<Vec<VersionAssociation>>, ApiError> {
    Ok(Json(state.store.list_associations(version_id).await?))
}

/// POST /api/versions/:id/associations
///
/// Replaces the whole association set of the version in one request.
pub async fn replace_associations(
    State(state): State<AppState>,
    Path(version_id): Path<i64>,
    Json(payload): Json<AssociationsPayload>,
) -> Result<StatusCode, ApiError> {
    let entries = payload.associations.unwrap_or_default();
    let saved = state
        .store
        .replace_associations(version_id, entries)
        .await?;
    tracing::info!(version_id, count = saved.len(), "associations replaced");
    Ok(StatusCode::CREATED)
}
