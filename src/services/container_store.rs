//! Row-level access to the `containers` and `container_history` tables.
//!
//! Every function takes a `&mut SqliteConnection` so callers can run several
//! of them inside one transaction (`&mut *tx`) or directly on a pooled
//! connection.

use super::{ServiceError, ServiceResult};
use crate::models::{
    container::{Container, ContainerPatch},
    history::{ContainerHistoryRecord, HistorySnapshot},
    status::ContainerStatus,
};
use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, SqliteConnection, sqlite::Sqlite};

const CONTAINER_COLUMNS: &str =
    "id, alias, status, location, assigned_client, notes, center, last_movement_at";

const HISTORY_COLUMNS: &str = "id, container_id, status, location, assigned_client, timestamp";

/// Fields for a brand-new container row, defaults already resolved.
#[derive(Debug, Clone)]
pub struct ContainerInsert {
    pub alias: String,
    pub status: ContainerStatus,
    pub location: String,
    pub assigned_client: Option<String>,
    pub notes: Option<String>,
    pub center: Option<String>,
}

pub async fn insert_container(
    conn: &mut SqliteConnection,
    fields: &ContainerInsert,
    now: DateTime<Utc>,
) -> ServiceResult<Container> {
    let container = sqlx::query_as::<_, Container>(&format!(
        "INSERT INTO containers (
            alias, status, location, assigned_client, notes, center, last_movement_at
         ) VALUES (?, ?, ?, ?, ?, ?, ?)
         RETURNING {CONTAINER_COLUMNS}"
    ))
    .bind(&fields.alias)
    .bind(fields.status)
    .bind(&fields.location)
    .bind(&fields.assigned_client)
    .bind(&fields.notes)
    .bind(&fields.center)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(container)
}

pub async fn get_container(conn: &mut SqliteConnection, id: i64) -> ServiceResult<Container> {
    sqlx::query_as::<_, Container>(&format!(
        "SELECT {CONTAINER_COLUMNS} FROM containers WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(ServiceError::ContainerNotFound(id))
}

/// All containers. Ordered by id so responses are stable, though callers
/// should not depend on it.
pub async fn list_containers(conn: &mut SqliteConnection) -> ServiceResult<Vec<Container>> {
    let rows = sqlx::query_as::<_, Container>(&format!(
        "SELECT {CONTAINER_COLUMNS} FROM containers ORDER BY id ASC"
    ))
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Apply only the fields present in `patch`; `last_movement_at` is always
/// refreshed.
pub async fn update_container(
    conn: &mut SqliteConnection,
    id: i64,
    patch: &ContainerPatch,
    now: DateTime<Utc>,
) -> ServiceResult<Container> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE containers SET last_movement_at = ");
    builder.push_bind(now);

    if let Some(status) = patch.status {
        builder.push(", status = ");
        builder.push_bind(status);
    }
    if let Some(location) = &patch.location {
        builder.push(", location = ");
        builder.push_bind(location.clone());
    }
    if let Some(client) = &patch.assigned_client {
        builder.push(", assigned_client = ");
        builder.push_bind(client.clone());
    }
    if let Some(notes) = &patch.notes {
        builder.push(", notes = ");
        builder.push_bind(notes.clone());
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);
    builder.push(" RETURNING ");
    builder.push(CONTAINER_COLUMNS);

    builder
        .build_query_as::<Container>()
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(ServiceError::ContainerNotFound(id))
}

/// Remove a container together with its history.
///
/// The history rows are deleted explicitly as well as through the foreign
/// key cascade, so the outcome does not depend on `PRAGMA foreign_keys`.
pub async fn delete_container(conn: &mut SqliteConnection, id: i64) -> ServiceResult<()> {
    sqlx::query("DELETE FROM container_history WHERE container_id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    let result = sqlx::query("DELETE FROM containers WHERE id = ?")
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ServiceError::ContainerNotFound(id));
    }

    Ok(())
}

pub async fn insert_history_record(
    conn: &mut SqliteConnection,
    container_id: i64,
    snapshot: &HistorySnapshot,
    now: DateTime<Utc>,
) -> ServiceResult<ContainerHistoryRecord> {
    let record = sqlx::query_as::<_, ContainerHistoryRecord>(&format!(
        "INSERT INTO container_history (container_id, status, location, assigned_client, timestamp)
         VALUES (?, ?, ?, ?, ?)
         RETURNING {HISTORY_COLUMNS}"
    ))
    .bind(container_id)
    .bind(snapshot.status)
    .bind(&snapshot.location)
    .bind(&snapshot.assigned_client)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    Ok(record)
}

/// History for one container, newest first. Empty when the id is unknown.
pub async fn list_history_for_container(
    conn: &mut SqliteConnection,
    container_id: i64,
) -> ServiceResult<Vec<ContainerHistoryRecord>> {
    let rows = sqlx::query_as::<_, ContainerHistoryRecord>(&format!(
        "SELECT {HISTORY_COLUMNS} FROM container_history
         WHERE container_id = ?
         ORDER BY timestamp DESC, id DESC"
    ))
    .bind(container_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Every history record, newest first.
pub async fn list_all_history(
    conn: &mut SqliteConnection,
) -> ServiceResult<Vec<ContainerHistoryRecord>> {
    let rows = sqlx::query_as::<_, ContainerHistoryRecord>(&format!(
        "SELECT {HISTORY_COLUMNS} FROM container_history ORDER BY timestamp DESC, id DESC"
    ))
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}
