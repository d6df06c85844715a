//! Core data models for the IBC tracker.
//!
//! Rows map to the `containers` and `container_history` tables via
//! `sqlx::FromRow` and serialize as JSON via `serde`.

pub mod container;
pub mod history;
pub mod report;
pub mod status;
