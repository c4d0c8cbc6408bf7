//! Village Model

use serde::{Deserialize, Serialize};

/// Village entity (collection grouping)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Village {
    pub id: i64,
    pub owner_id: String,
    pub name: String,
    /// Cached agent ids (JSON array, may be empty)
    #[cfg_attr(feature = "db", sqlx(json))]
    #[serde(default)]
    pub agent_ids: Vec<i64>,
    pub created_at: i64,
}

/// Create village payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VillageCreate {
    pub name: String,
}
