//! ReportService: read-only views over containers and their history.
//!
//! Nothing here writes or pulses live viewers.

use super::{ServiceResult, container_store};
use crate::models::{
    history::ContainerHistoryRecord,
    report::{ClientCount, DashboardSummary},
    status::ContainerStatus,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Header row of the history export.
pub const CSV_HEADER: [&str; 6] = [
    "RecordId",
    "ContainerId",
    "Timestamp",
    "Status",
    "Location",
    "AssignedClient",
];

const CSV_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A rendered CSV document ready to be served as a download.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

#[derive(Clone)]
pub struct ReportService {
    pub db: Arc<SqlitePool>,
}

impl ReportService {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Counts by status across the whole fleet.
    pub async fn dashboard_summary(&self) -> ServiceResult<DashboardSummary> {
        let rows: Vec<(ContainerStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM containers GROUP BY status")
                .fetch_all(&*self.db)
                .await?;

        let mut summary = DashboardSummary::default();
        for (status, count) in rows {
            summary.total += count;
            match status {
                ContainerStatus::AtPlant => summary.total_at_plant += count,
                ContainerStatus::InWash => summary.total_in_wash += count,
                ContainerStatus::AtClient => summary.total_at_client += count,
                ContainerStatus::Damaged => summary.total_damaged += count,
            }
        }
        Ok(summary)
    }

    /// Units currently at a client, grouped by client, largest first.
    pub async fn client_breakdown(&self) -> ServiceResult<Vec<ClientCount>> {
        let rows = sqlx::query_as::<_, ClientCount>(
            "SELECT assigned_client AS client, COUNT(*) AS count
             FROM containers
             WHERE status = ?
             GROUP BY assigned_client
             ORDER BY count DESC, client ASC",
        )
        .bind(ContainerStatus::AtClient)
        .fetch_all(&*self.db)
        .await?;

        Ok(rows)
    }

    /// History of one container, newest first. Empty rather than an error
    /// when the container has no records or does not exist.
    pub async fn history_for_container(
        &self,
        id: i64,
    ) -> ServiceResult<Vec<ContainerHistoryRecord>> {
        let mut conn = self.db.acquire().await?;
        container_store::list_history_for_container(&mut conn, id).await
    }

    pub async fn all_history(&self) -> ServiceResult<Vec<ContainerHistoryRecord>> {
        let mut conn = self.db.acquire().await?;
        container_store::list_all_history(&mut conn).await
    }

    /// Render the full history feed as CSV, named after today's date.
    pub async fn export_history_csv(&self) -> ServiceResult<CsvExport> {
        let records = self.all_history().await?;
        Ok(CsvExport {
            filename: export_filename(Utc::now().date_naive()),
            body: render_history_csv(&records),
        })
    }
}

pub fn export_filename(date: NaiveDate) -> String {
    format!("container_history_{}.csv", date.format("%Y-%m-%d"))
}

pub fn render_history_csv(records: &[ContainerHistoryRecord]) -> String {
    let mut out = String::new();
    push_csv_row(&mut out, CSV_HEADER.iter().map(|h| h.to_string()));
    for record in records {
        push_csv_row(
            &mut out,
            [
                record.id.to_string(),
                record.container_id.to_string(),
                format_timestamp(record.timestamp),
                record.status.to_string(),
                record.location.clone(),
                record.assigned_client.clone().unwrap_or_default(),
            ],
        );
    }
    out
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format(CSV_TIMESTAMP_FORMAT).to_string()
}

fn push_csv_row(out: &mut String, fields: impl IntoIterator<Item = String>) {
    let row = fields
        .into_iter()
        .map(|f| csv_escape(&f))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&row);
    out.push_str("\r\n");
}

/// Quote a field when it contains a separator, quote or line break.
fn csv_escape(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
