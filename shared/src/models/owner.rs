//! Owner Model

use serde::{Deserialize, Serialize};

/// Owner entity (the business whose data is partitioned by `owner_id`)
///
/// `external_uid` is the identity provider's subject and doubles as the
/// partition key for every other record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: i64,
    pub external_uid: String,
    pub email: String,
    pub name: Option<String>,
    pub created_at: i64,
}
