//! Agent Model (field collector)

use serde::{Deserialize, Serialize};

/// Agent entity
///
/// `phone` is the login key. It is unique per owner by lookup semantics only;
/// the store carries no uniqueness constraint for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    pub id: i64,
    pub owner_id: String,
    pub phone: String,
    /// Opaque one-way credential hash of the PIN
    pub pin_hash: String,
    pub name: String,
    /// JSON array of village ids
    #[cfg_attr(feature = "db", sqlx(json))]
    #[serde(default)]
    pub assigned_villages: Vec<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Agent {
    pub fn is_assigned_to(&self, village_id: i64) -> bool {
        self.assigned_villages.contains(&village_id)
    }
}

/// Create agent payload (PIN in clear, hashed before storage)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentCreate {
    pub name: String,
    pub phone: String,
    pub pin: String,
    #[serde(default)]
    pub assigned_villages: Vec<i64>,
}

/// Update agent payload
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentUpdate {
    pub name: Option<String>,
    pub assigned_villages: Option<Vec<i64>>,
}
