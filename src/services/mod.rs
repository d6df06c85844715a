//! Service layer: persistence, state transitions, reporting and live fan-out.

pub mod broadcaster;
pub mod container_service;
pub mod container_store;
pub mod report_service;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("container `{0}` not found")]
    ContainerNotFound(i64),
    #[error("invalid request: {0}")]
    Validation(String),
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

pub type ServiceResult<T> = Result<T, ServiceError>;
