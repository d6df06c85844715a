//! Dashboard aggregates and the global history feed.

use crate::{
    AppState,
    errors::AppError,
    models::{
        history::ContainerHistoryRecord,
        report::{ClientCount, DashboardSummary},
    },
};
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::Response,
};

/// GET `/api/history/all`
pub async fn all_history(
    State(state): State<AppState>,
) -> Result<Json<Vec<ContainerHistoryRecord>>, AppError> {
    Ok(Json(state.reports.all_history().await?))
}

/// GET `/api/history/export` — CSV attachment of the full history.
pub async fn export_history(State(state): State<AppState>) -> Result<Response, AppError> {
    let export = state.reports.export_history_csv().await?;
    let disposition = format!("attachment; filename=\"{}\"", export.filename);

    let mut response = Response::new(Body::from(export.body));
    *response.status_mut() = StatusCode::OK;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/csv; charset=utf-8"),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    Ok(response)
}

/// GET `/api/dashboard-data`
pub async fn dashboard_data(
    State(state): State<AppState>,
) -> Result<Json<DashboardSummary>, AppError> {
    Ok(Json(state.reports.dashboard_summary().await?))
}

/// GET `/api/dashboard-clients`
pub async fn dashboard_clients(
    State(state): State<AppState>,
) -> Result<Json<Vec<ClientCount>>, AppError> {
    Ok(Json(state.reports.client_breakdown().await?))
}
