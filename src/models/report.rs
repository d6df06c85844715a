//! Read-only aggregates served to the dashboards.

use serde::{Deserialize, Serialize};

/// KPI counts by status.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total: i64,
    pub total_at_plant: i64,
    pub total_in_wash: i64,
    pub total_at_client: i64,
    pub total_damaged: i64,
}

/// Number of containers currently held by one client.
///
/// `client` is `None` for units marked at a client without a name recorded.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct ClientCount {
    pub client: Option<String>,
    pub count: i64,
}
