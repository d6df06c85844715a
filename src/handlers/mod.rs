//! HTTP handlers. Each delegates to a service on `AppState` and maps
//! `ServiceError` into `AppError`.

pub mod container_handlers;
pub mod health_handlers;
pub mod live_handlers;
pub mod report_handlers;
