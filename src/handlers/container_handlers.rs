//! HTTP handlers for container CRUD and per-container history.

use crate::{
    AppState,
    errors::AppError,
    models::{
        container::{Container, ContainerDetail, ContainerPatch, NewContainer},
        history::ContainerHistoryRecord,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// GET `/api/containers/` — list every container.
pub async fn list_containers(
    State(state): State<AppState>,
) -> Result<Json<Vec<Container>>, AppError> {
    Ok(Json(state.containers.list().await?))
}

/// GET `/api/containers/{id}` — the container with its history embedded.
pub async fn get_container(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContainerDetail>, AppError> {
    Ok(Json(state.containers.get_with_history(id).await?))
}

/// POST `/api/containers/` — register a new unit at the plant.
pub async fn create_container(
    State(state): State<AppState>,
    Json(payload): Json<NewContainer>,
) -> Result<impl IntoResponse, AppError> {
    let container = state.containers.create(payload).await?;
    Ok((StatusCode::CREATED, Json(container)))
}

/// PATCH `/api/containers/{id}` — apply only the supplied fields.
pub async fn update_container(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(patch): Json<ContainerPatch>,
) -> Result<Json<Container>, AppError> {
    Ok(Json(state.containers.update(id, patch).await?))
}

/// DELETE `/api/containers/{id}`
pub async fn delete_container(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, AppError> {
    state.containers.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET `/api/containers/{id}/history` — newest first, `[]` when empty.
pub async fn container_history(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ContainerHistoryRecord>>, AppError> {
    Ok(Json(state.reports.history_for_container(id).await?))
}
