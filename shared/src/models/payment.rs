//! Payment Model (one collection event)

use serde::{Deserialize, Serialize};

use super::sync::SyncStatus;

/// Payment entity
///
/// Immutable once created except for the `sync_status` transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: i64,
    pub owner_id: String,
    pub sale_id: i64,
    pub amount: f64,
    pub collected_by_agent_id: i64,
    pub collected_at: i64,
    pub created_at: i64,
    #[serde(default)]
    pub sync_status: SyncStatus,
}
