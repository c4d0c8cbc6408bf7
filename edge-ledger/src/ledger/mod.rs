//! Ledger Store
//!
//! [`Ledger`] is the device-level handle over the SQLite database. Apart from
//! the owner row and the agent phone lookup used during login, every record
//! access goes through a [`LedgerStore`] bound to one owner partition.

mod store;

pub use store::LedgerStore;

use crate::db::DbService;
use crate::db::repository::{agent, owner};
use shared::error::AppResult;
use shared::models::{Agent, Owner};
use sqlx::SqlitePool;

#[derive(Debug, Clone)]
pub struct Ledger {
    db: DbService,
}

impl Ledger {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    /// Open the database file (created and migrated if needed)
    pub async fn open(db_path: &str) -> AppResult<Self> {
        Ok(Self::new(DbService::new(db_path).await?))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// Store scoped to one owner partition
    pub fn scoped(&self, owner_id: impl Into<String>) -> LedgerStore {
        LedgerStore::new(self.db.pool.clone(), owner_id.into())
    }

    /// Agents with this phone across all partitions on the device, oldest first
    pub async fn agents_by_phone(&self, phone: &str) -> AppResult<Vec<Agent>> {
        Ok(agent::find_any_by_phone(&self.db.pool, phone.trim()).await?)
    }

    pub async fn owner(&self, external_uid: &str) -> AppResult<Option<Owner>> {
        Ok(owner::find_by_external_uid(&self.db.pool, external_uid).await?)
    }

    /// Record or refresh the local owner row after an identity-provider login
    pub async fn upsert_owner(
        &self,
        external_uid: &str,
        email: &str,
        name: Option<&str>,
    ) -> AppResult<Owner> {
        Ok(owner::upsert(&self.db.pool, external_uid, email, name).await?)
    }

    pub async fn close(&self) {
        self.db.pool.close().await;
    }
}
