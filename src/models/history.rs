//! Append-only audit entries written alongside every container change.

use super::{container::Container, status::ContainerStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Immutable snapshot of a container's tracked fields at one point in time.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct ContainerHistoryRecord {
    pub id: i64,

    /// Owning container.
    pub container_id: i64,

    pub status: ContainerStatus,
    pub location: String,
    pub assigned_client: Option<String>,

    /// Server-assigned creation time; the ordering key for history feeds.
    pub timestamp: DateTime<Utc>,
}

/// The subset of container fields captured by a history record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySnapshot {
    pub status: ContainerStatus,
    pub location: String,
    pub assigned_client: Option<String>,
}

impl From<&Container> for HistorySnapshot {
    fn from(container: &Container) -> Self {
        Self {
            status: container.status,
            location: container.location.clone(),
            assigned_client: container.assigned_client.clone(),
        }
    }
}
