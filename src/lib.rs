//! IBC container tracking service.
//!
//! Tracks reusable intermediate bulk containers around the plant circuit
//! (plant, wash station, client sites). Every accepted change writes an
//! immutable history record in the same transaction and pulses connected
//! dashboards over `/ws` so they re-fetch.

pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

use axum::Router;
use services::{
    broadcaster::Broadcaster, container_service::ContainerService, report_service::ReportService,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<SqlitePool>,
    pub containers: ContainerService,
    pub reports: ReportService,
    pub broadcaster: Broadcaster,
}

impl AppState {
    pub fn new(db: Arc<SqlitePool>, default_plant: impl Into<String>) -> Self {
        let broadcaster = Broadcaster::new();
        Self {
            containers: ContainerService::new(db.clone(), broadcaster.clone(), default_plant),
            reports: ReportService::new(db.clone()),
            broadcaster,
            db,
        }
    }
}

/// Build the full application: routes, CORS and request tracing.
pub fn build_app(state: AppState, allowed_origins: &[String]) -> Router {
    routes::routes::routes()
        .layer(routes::cors::cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
