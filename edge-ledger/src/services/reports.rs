//! Reports and export

use crate::ledger::LedgerStore;
use crate::schedule;
use shared::error::AppResult;
use shared::models::{Agent, Customer, OwnerSnapshot, OwnerStats, SaleStatus, VillageDue};
use shared::util::now_millis;

/// Read-only summaries over one owner partition
#[derive(Clone)]
pub struct ReportService {
    store: LedgerStore,
}

impl ReportService {
    pub fn new(store: LedgerStore) -> Self {
        Self { store }
    }

    /// All six collections of the partition (export)
    pub async fn export_snapshot(&self) -> AppResult<OwnerSnapshot> {
        let snapshot = self.store.snapshot().await?;
        tracing::debug!(
            owner_id = %self.store.owner_id(),
            records = snapshot.record_count(),
            "Snapshot exported"
        );
        Ok(snapshot)
    }

    pub async fn owner_stats(&self) -> AppResult<OwnerStats> {
        Ok(OwnerStats {
            total_collected: self.store.total_collected().await?,
            active_sales: self.store.count_sales(SaleStatus::Active).await?,
            customers: self.store.count_customers().await?,
            pending_sync: self.store.pending_count().await?,
        })
    }

    pub async fn village_dues(&self, agent: &Agent) -> AppResult<Vec<VillageDue>> {
        self.village_dues_at(agent, now_millis()).await
    }

    /// Due amount per village assigned to `agent`, evaluated at `now`
    ///
    /// Villages that no longer exist locally are skipped.
    pub async fn village_dues_at(&self, agent: &Agent, now: i64) -> AppResult<Vec<VillageDue>> {
        let mut dues = Vec::with_capacity(agent.assigned_villages.len());
        for village_id in &agent.assigned_villages {
            let Some(village) = self.store.village(*village_id).await? else {
                continue;
            };
            let active = self.store.active_sales_in_village(village.id).await?;
            let due_sales = active.iter().filter(|s| schedule::is_due(s, now)).count() as i64;
            dues.push(VillageDue {
                village_id: village.id,
                village_name: village.name,
                due_amount: schedule::due_amount(&active, now),
                due_sales,
            });
        }
        Ok(dues)
    }

    pub async fn pending_count(&self) -> AppResult<i64> {
        self.store.pending_count().await
    }

    pub async fn customers_in_village(&self, village_id: i64) -> AppResult<Vec<Customer>> {
        self.store.customers_in_village(village_id).await
    }
}
