//! ContainerService: the only write path for containers.
//!
//! Every accepted mutation runs inside one SQLite transaction that changes
//! the container row and appends the history record snapshotting its
//! resulting state. Live viewers are pulsed only after the commit succeeds.
//!
//! Writes open with `BEGIN IMMEDIATE` and read the clock only once the write
//! lock is held, so history timestamps follow commit order.

use super::{
    ServiceError, ServiceResult,
    broadcaster::Broadcaster,
    container_store::{self, ContainerInsert},
};
use crate::models::{
    container::{Container, ContainerDetail, ContainerPatch, NewContainer},
    history::HistorySnapshot,
    status::ContainerStatus,
};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ContainerService {
    pub db: Arc<SqlitePool>,
    pub broadcaster: Broadcaster,

    /// Location and center given to containers created without one.
    pub default_plant: String,
}

impl ContainerService {
    pub fn new(
        db: Arc<SqlitePool>,
        broadcaster: Broadcaster,
        default_plant: impl Into<String>,
    ) -> Self {
        Self {
            db,
            broadcaster,
            default_plant: default_plant.into(),
        }
    }

    pub async fn get(&self, id: i64) -> ServiceResult<Container> {
        let mut conn = self.db.acquire().await?;
        container_store::get_container(&mut conn, id).await
    }

    /// A container with its history, newest first.
    pub async fn get_with_history(&self, id: i64) -> ServiceResult<ContainerDetail> {
        let mut conn = self.db.acquire().await?;
        let container = container_store::get_container(&mut conn, id).await?;
        let history = container_store::list_history_for_container(&mut conn, id).await?;
        Ok(ContainerDetail { container, history })
    }

    pub async fn list(&self) -> ServiceResult<Vec<Container>> {
        let mut conn = self.db.acquire().await?;
        container_store::list_containers(&mut conn).await
    }

    /// Register a new unit at the plant and write its first history record.
    pub async fn create(&self, request: NewContainer) -> ServiceResult<Container> {
        let alias = request.alias.trim();
        if alias.is_empty() {
            return Err(ServiceError::Validation("alias must not be blank".into()));
        }

        let center = non_blank(request.center).unwrap_or_else(|| self.default_plant.clone());
        let fields = ContainerInsert {
            alias: alias.to_string(),
            status: ContainerStatus::default(),
            location: self.default_plant.clone(),
            assigned_client: None,
            notes: non_blank(request.notes),
            center: Some(center),
        };

        let mut tx = self.begin_write().await?;
        let now = Utc::now();
        let container = container_store::insert_container(&mut tx, &fields, now).await?;
        container_store::insert_history_record(
            &mut tx,
            container.id,
            &HistorySnapshot::from(&container),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            container_id = container.id,
            alias = %container.alias,
            status = %container.status,
            "container created"
        );
        self.broadcaster.broadcast();
        Ok(container)
    }

    /// Apply a partial update. An empty patch still appends a history record
    /// repeating the unchanged state.
    pub async fn update(&self, id: i64, patch: ContainerPatch) -> ServiceResult<Container> {
        if let Some(location) = &patch.location {
            if location.trim().is_empty() {
                return Err(ServiceError::Validation("location must not be blank".into()));
            }
        }

        if patch.is_empty() {
            debug!(container_id = id, "empty patch, recording unchanged state");
        }

        let mut tx = self.begin_write().await?;
        let now = Utc::now();
        let container = container_store::update_container(&mut tx, id, &patch, now).await?;
        container_store::insert_history_record(
            &mut tx,
            container.id,
            &HistorySnapshot::from(&container),
            now,
        )
        .await?;
        tx.commit().await?;

        info!(
            container_id = container.id,
            status = %container.status,
            location = %container.location,
            assigned_client = ?container.assigned_client,
            "container updated"
        );
        self.broadcaster.broadcast();
        Ok(container)
    }

    /// Remove a container and its history.
    pub async fn delete(&self, id: i64) -> ServiceResult<()> {
        let mut tx = self.begin_write().await?;
        container_store::delete_container(&mut tx, id).await?;
        tx.commit().await?;

        info!(container_id = id, "container deleted");
        self.broadcaster.broadcast();
        Ok(())
    }

    /// Open a transaction that already holds SQLite's write lock.
    async fn begin_write(&self) -> ServiceResult<Transaction<'static, Sqlite>> {
        Ok(self.db.begin_with("BEGIN IMMEDIATE").await?)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::history::ContainerHistoryRecord, services::broadcaster::Pulse};

    async fn service() -> ContainerService {
        let pool = db::connect("sqlite::memory:", 1).await.unwrap();
        ContainerService::new(Arc::new(pool), Broadcaster::new(), "Planta Bogotá")
    }

    fn new_container(alias: &str) -> NewContainer {
        NewContainer {
            alias: alias.into(),
            center: None,
            notes: None,
        }
    }

    fn snapshot(record: &ContainerHistoryRecord) -> HistorySnapshot {
        HistorySnapshot {
            status: record.status,
            location: record.location.clone(),
            assigned_client: record.assigned_client.clone(),
        }
    }

    async fn history(service: &ContainerService, id: i64) -> Vec<ContainerHistoryRecord> {
        let mut conn = service.db.acquire().await.unwrap();
        container_store::list_history_for_container(&mut conn, id)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_writes_one_matching_history_record() {
        let service = service().await;
        let container = service.create(new_container("IBC-001")).await.unwrap();

        assert_eq!(container.status, ContainerStatus::AtPlant);
        assert_eq!(container.location, "Planta Bogotá");
        assert_eq!(container.center.as_deref(), Some("Planta Bogotá"));
        assert_eq!(container.assigned_client, None);

        let records = history(&service, container.id).await;
        assert_eq!(records.len(), 1);
        assert_eq!(snapshot(&records[0]), HistorySnapshot::from(&container));
    }

    #[tokio::test]
    async fn create_keeps_requested_center() {
        let service = service().await;
        let container = service
            .create(NewContainer {
                alias: "  IBC-002 ".into(),
                center: Some("Planta Medellín".into()),
                notes: Some("   ".into()),
            })
            .await
            .unwrap();

        assert_eq!(container.alias, "IBC-002");
        assert_eq!(container.center.as_deref(), Some("Planta Medellín"));
        assert_eq!(container.location, "Planta Bogotá");
        assert_eq!(container.notes, None);
    }

    #[tokio::test]
    async fn blank_alias_is_rejected_before_touching_the_store() {
        let service = service().await;
        let err = service.create(new_container("   ")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert!(service.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_appends_snapshot_of_resulting_state() {
        let service = service().await;
        let container = service.create(new_container("IBC-003")).await.unwrap();

        let updated = service
            .update(
                container.id,
                ContainerPatch {
                    status: Some(ContainerStatus::AtClient),
                    location: Some("Acme yard".into()),
                    assigned_client: Some(Some("Acme".into())),
                    notes: Some(Some("left at dock 4".into())),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.status, ContainerStatus::AtClient);
        assert_eq!(updated.notes.as_deref(), Some("left at dock 4"));
        assert!(updated.last_movement_at >= container.last_movement_at);

        let records = history(&service, container.id).await;
        assert_eq!(records.len(), 2);
        assert_eq!(snapshot(&records[0]), HistorySnapshot::from(&updated));
        assert_eq!(snapshot(&records[1]), HistorySnapshot::from(&container));
    }

    #[tokio::test]
    async fn empty_patch_still_appends_one_record() {
        let service = service().await;
        let container = service.create(new_container("IBC-004")).await.unwrap();

        let updated = service
            .update(container.id, ContainerPatch::default())
            .await
            .unwrap();

        assert_eq!(updated.status, container.status);
        assert_eq!(updated.location, container.location);

        let records = history(&service, container.id).await;
        assert_eq!(records.len(), 2);
        assert_eq!(snapshot(&records[0]), snapshot(&records[1]));
    }

    #[tokio::test]
    async fn explicit_null_clears_the_client() {
        let service = service().await;
        let container = service.create(new_container("IBC-005")).await.unwrap();
        service
            .update(
                container.id,
                ContainerPatch {
                    status: Some(ContainerStatus::AtClient),
                    assigned_client: Some(Some("Acme".into())),
                    ..ContainerPatch::default()
                },
            )
            .await
            .unwrap();

        let returned = service
            .update(
                container.id,
                ContainerPatch {
                    status: Some(ContainerStatus::InWash),
                    assigned_client: Some(None),
                    ..ContainerPatch::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(returned.assigned_client, None);
        let records = history(&service, container.id).await;
        assert_eq!(records[0].assigned_client, None);
        assert_eq!(records[1].assigned_client.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn any_transition_is_accepted() {
        let service = service().await;
        let container = service.create(new_container("IBC-006")).await.unwrap();

        for status in [
            ContainerStatus::Damaged,
            ContainerStatus::AtClient,
            ContainerStatus::AtPlant,
            ContainerStatus::InWash,
            ContainerStatus::Damaged,
        ] {
            let patch = ContainerPatch {
                status: Some(status),
                ..ContainerPatch::default()
            };
            assert_eq!(service.update(container.id, patch).await.unwrap().status, status);
        }

        assert_eq!(history(&service, container.id).await.len(), 6);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found_and_write_nothing() {
        let service = service().await;

        let err = service.update(99, ContainerPatch::default()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ContainerNotFound(99)));
        let err = service.delete(99).await.unwrap_err();
        assert!(matches!(err, ServiceError::ContainerNotFound(99)));
        assert!(history(&service, 99).await.is_empty());
    }

    #[tokio::test]
    async fn blank_location_is_rejected() {
        let service = service().await;
        let container = service.create(new_container("IBC-007")).await.unwrap();
        let err = service
            .update(
                container.id,
                ContainerPatch {
                    location: Some("  ".into()),
                    ..ContainerPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(history(&service, container.id).await.len(), 1);
    }

    #[tokio::test]
    async fn every_accepted_write_pulses_viewers() {
        let service = service().await;
        let (_viewer, mut pulses) = service.broadcaster.register();

        let container = service.create(new_container("IBC-008")).await.unwrap();
        assert_eq!(pulses.try_recv().ok(), Some(Pulse));

        service
            .update(container.id, ContainerPatch::default())
            .await
            .unwrap();
        assert_eq!(pulses.try_recv().ok(), Some(Pulse));

        service.delete(container.id).await.unwrap();
        assert_eq!(pulses.try_recv().ok(), Some(Pulse));

        assert!(service.delete(container.id).await.is_err());
        assert!(pulses.try_recv().is_err());
    }

    #[tokio::test]
    async fn delete_removes_container_and_history() {
        let service = service().await;
        let container = service.create(new_container("IBC-009")).await.unwrap();
        service.delete(container.id).await.unwrap();

        assert!(matches!(
            service.get(container.id).await,
            Err(ServiceError::ContainerNotFound(_))
        ));
        assert!(history(&service, container.id).await.is_empty());
    }

    #[tokio::test]
    async fn detail_carries_history_newest_first() {
        let service = service().await;
        let container = service.create(new_container("IBC-010")).await.unwrap();
        service
            .update(
                container.id,
                ContainerPatch {
                    status: Some(ContainerStatus::InWash),
                    ..ContainerPatch::default()
                },
            )
            .await
            .unwrap();

        let detail = service.get_with_history(container.id).await.unwrap();
        assert_eq!(detail.container.status, ContainerStatus::InWash);
        assert_eq!(detail.history.len(), 2);
        assert_eq!(snapshot(&detail.history[0]), HistorySnapshot::from(&detail.container));
        assert_eq!(detail.history[1].status, ContainerStatus::AtPlant);

        assert!(matches!(
            service.get_with_history(container.id + 1).await,
            Err(ServiceError::ContainerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn failed_history_insert_rolls_back_the_whole_write() {
        let service = service().await;
        let container = service.create(new_container("IBC-011")).await.unwrap();
        sqlx::query(
            "CREATE TRIGGER reject_history BEFORE INSERT ON container_history
             BEGIN SELECT RAISE(ABORT, 'history rejected'); END",
        )
        .execute(&*service.db)
        .await
        .unwrap();
        let (_viewer, mut pulses) = service.broadcaster.register();

        let err = service.create(new_container("IBC-012")).await.unwrap_err();
        assert!(matches!(err, ServiceError::Sqlx(_)));
        assert_eq!(service.list().await.unwrap(), vec![container.clone()]);

        let err = service
            .update(
                container.id,
                ContainerPatch {
                    status: Some(ContainerStatus::Damaged),
                    location: Some("Scrap yard".into()),
                    ..ContainerPatch::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Sqlx(_)));

        let unchanged = service.get(container.id).await.unwrap();
        assert_eq!(unchanged, container);
        assert_eq!(history(&service, container.id).await.len(), 1);
        assert!(pulses.try_recv().is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_updates_keep_newest_history_in_step_with_the_row() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("tracker.db").display());
        let pool = db::connect(&url, 8).await.unwrap();
        let service = ContainerService::new(Arc::new(pool), Broadcaster::new(), "Planta Bogotá");
        let id = service.create(new_container("IBC-race")).await.unwrap().id;

        const ROUNDS: usize = 20;
        const WRITERS: usize = 8;
        for round in 0..ROUNDS {
            let writers = (0..WRITERS)
                .map(|writer| {
                    let service = service.clone();
                    tokio::spawn(async move {
                        let patch = ContainerPatch {
                            location: Some(format!("loc-{round}-{writer}")),
                            ..ContainerPatch::default()
                        };
                        service.update(id, patch).await
                    })
                })
                .collect::<Vec<_>>();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }

            let current = service.get(id).await.unwrap();
            let records = history(&service, id).await;
            assert_eq!(
                snapshot(&records[0]),
                HistorySnapshot::from(&current),
                "round {round}"
            );
        }

        assert_eq!(history(&service, id).await.len(), 1 + ROUNDS * WRITERS);
    }
}
