//! Defines routes for the container tracking API.
//!
//! ## Structure
//! - **Containers**
//!   - `GET    /api/containers/`              — list all
//!   - `POST   /api/containers/`              — create
//!   - `GET    /api/containers/{id}`          — fetch one
//!   - `PATCH  /api/containers/{id}`          — partial update
//!   - `DELETE /api/containers/{id}`          — delete with history
//!   - `GET    /api/containers/{id}/history`  — history, newest first
//!
//! - **Reporting**
//!   - `GET /api/history/all`, `GET /api/history/export`
//!   - `GET /api/dashboard-data`, `GET /api/dashboard-clients`
//!
//! - **Live**
//!   - `GET /ws` — WebSocket upgrade, emits `update` pulses

use crate::{
    AppState,
    handlers::{
        container_handlers::{
            container_history, create_container, delete_container, get_container,
            list_containers, update_container,
        },
        health_handlers::{healthz, readyz, root},
        live_handlers::live_updates,
        report_handlers::{all_history, dashboard_clients, dashboard_data, export_history},
    },
};
use axum::{Router, routing::get};

/// Build the router for every API route, carrying `AppState` to handlers.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        // Container collection, with and without the trailing slash
        .route(
            "/api/containers/",
            get(list_containers).post(create_container),
        )
        .route(
            "/api/containers",
            get(list_containers).post(create_container),
        )
        // Single container
        .route(
            "/api/containers/{id}",
            get(get_container)
                .patch(update_container)
                .delete(delete_container),
        )
        .route("/api/containers/{id}/history", get(container_history))
        // Reporting
        .route("/api/history/all", get(all_history))
        .route("/api/history/export", get(export_history))
        .route("/api/dashboard-data", get(dashboard_data))
        .route("/api/dashboard-clients", get(dashboard_clients))
        // Live updates
        .route("/ws", get(live_updates))
}
