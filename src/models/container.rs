//! Represents one physical IBC unit and the payloads that create or modify it.

use super::{history::ContainerHistoryRecord, status::ContainerStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;

/// An intermediate bulk container tracked across the plant circuit.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug, PartialEq)]
pub struct Container {
    /// Store-assigned identifier.
    pub id: i64,

    /// Human-readable label painted on the unit (e.g. "IBC-001").
    pub alias: String,

    /// Current operational state.
    pub status: ContainerStatus,

    /// Free-text physical location.
    pub location: String,

    /// Client holding the unit, if any.
    pub assigned_client: Option<String>,

    /// Operator observations. Not part of the history snapshot.
    pub notes: Option<String>,

    /// Owning facility.
    pub center: Option<String>,

    /// Refreshed on every accepted change.
    pub last_movement_at: DateTime<Utc>,
}

/// `GET /api/containers/{id}`: the container fields plus its history,
/// newest first.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContainerDetail {
    #[serde(flatten)]
    pub container: Container,
    pub history: Vec<ContainerHistoryRecord>,
}

/// Body of `POST /api/containers/`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewContainer {
    pub alias: String,
    #[serde(default)]
    pub center: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `PATCH /api/containers/{id}`.
///
/// `status` and `location` are required columns, so `null` is read the same
/// as an absent key. `assigned_client` and `notes` are nullable: an absent
/// key leaves the column alone, an explicit `null` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerPatch {
    #[serde(default)]
    pub status: Option<ContainerStatus>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub assigned_client: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub notes: Option<Option<String>>,
}

impl ContainerPatch {
    pub fn is_empty(&self) -> bool {
        self.status.is_none()
            && self.location.is_none()
            && self.assigned_client.is_none()
            && self.notes.is_none()
    }
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
