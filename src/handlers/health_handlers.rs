//! Service banner, liveness and readiness.
//!
//! - GET /        -> service name and status
//! - GET /healthz -> simple liveness ("ok")
//! - GET /readyz  -> readiness that checks DB connectivity

use crate::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::Serialize;

/// `GET /`
pub async fn root() -> impl IntoResponse {
    Json(BannerResponse {
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
    })
}

/// `GET /healthz`
///
/// Liveness check; never performs I/O.
pub async fn healthz() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "ok".into(),
        }),
    )
}

/// `GET /readyz`
///
/// Runs `SELECT 1` against the pool. HTTP 200 when it succeeds, 503
/// otherwise.
pub async fn readyz(State(state): State<AppState>) -> impl IntoResponse {
    let sqlite_check = match sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(&*state.db)
        .await
    {
        Ok(1) => CheckStatus {
            ok: true,
            error: None,
        },
        Ok(v) => CheckStatus {
            ok: false,
            error: Some(format!("unexpected result: {}", v)),
        },
        Err(e) => CheckStatus {
            ok: false,
            error: Some(format!("error: {}", e)),
        },
    };

    let (status, label) = if sqlite_check.ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "error")
    };

    (
        status,
        Json(ReadyResponse {
            status: label.into(),
            viewers: state.broadcaster.viewer_count(),
            sqlite: sqlite_check,
        }),
    )
}

#[derive(Serialize)]
struct BannerResponse {
    service: &'static str,
    version: &'static str,
    status: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Serialize)]
struct ReadyResponse {
    status: String,
    viewers: usize,
    sqlite: CheckStatus,
}

#[derive(Serialize)]
struct CheckStatus {
    ok: bool,
    error: Option<String>,
}
