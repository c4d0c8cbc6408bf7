//! Owner-scoped store wrapper

use crate::db::repository::{RepoError, agent, customer, payment, product, sale, village};
use shared::error::{AppError, AppResult, ErrorCode};
use shared::models::{
    Agent, AgentCreate, AgentUpdate, Customer, CustomerCreate, CustomerUpdate, OwnerSnapshot,
    Payment, Product, ProductCreate, Sale, SaleCreate, SaleCustomer, SaleStatus, SyncStatus,
    Village, VillageCreate,
};
use shared::util::{now_millis, snowflake_id};
use sqlx::SqlitePool;

/// Ledger Store bound to one `owner_id`
///
/// Every query carries the bound owner id; there is no unscoped read or
/// write path on this type. `put_*` (insert-or-replace with the caller's id)
/// is distinct from `insert_*` (store-assigned id) and rejects records of
/// another partition.
#[derive(Debug, Clone)]
pub struct LedgerStore {
    pool: SqlitePool,
    owner_id: String,
}

impl LedgerStore {
    pub(crate) fn new(pool: SqlitePool, owner_id: String) -> Self {
        Self { pool, owner_id }
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    fn check_partition(&self, kind: &str, id: i64, owner_id: &str) -> AppResult<()> {
        if owner_id != self.owner_id {
            return Err(AppError::new(ErrorCode::OwnerMismatch)
                .with_detail("kind", kind)
                .with_detail("id", id)
                .with_detail("owner_id", owner_id));
        }
        Ok(())
    }

    // ==================== Villages ====================

    pub async fn villages(&self) -> AppResult<Vec<Village>> {
        Ok(village::find_all(&self.pool, &self.owner_id).await?)
    }

    pub async fn village(&self, id: i64) -> AppResult<Option<Village>> {
        Ok(village::find_by_id(&self.pool, &self.owner_id, id).await?)
    }

    pub async fn insert_village(&self, data: VillageCreate) -> AppResult<Village> {
        let record = Village {
            id: snowflake_id(),
            owner_id: self.owner_id.clone(),
            name: data.name,
            agent_ids: Vec::new(),
            created_at: now_millis(),
        };
        village::insert(&self.pool, &record).await?;
        Ok(record)
    }

    pub async fn put_village(&self, record: &Village) -> AppResult<()> {
        self.check_partition("village", record.id, &record.owner_id)?;
        Ok(village::put(&self.pool, record).await?)
    }

    // ==================== Products ====================

    pub async fn products(&self) -> AppResult<Vec<Product>> {
        Ok(product::find_all(&self.pool, &self.owner_id).await?)
    }

    pub async fn product(&self, id: i64) -> AppResult<Option<Product>> {
        Ok(product::find_by_id(&self.pool, &self.owner_id, id).await?)
    }

    pub async fn insert_product(&self, data: ProductCreate) -> AppResult<Product> {
        let record = Product {
            id: snowflake_id(),
            owner_id: self.owner_id.clone(),
            name: data.name,
            created_at: now_millis(),
        };
        product::insert(&self.pool, &record).await?;
        Ok(record)
    }

    pub async fn put_product(&self, record: &Product) -> AppResult<()> {
        self.check_partition("product", record.id, &record.owner_id)?;
        Ok(product::put(&self.pool, record).await?)
    }

    // ==================== Agents ====================

    pub async fn agents(&self) -> AppResult<Vec<Agent>> {
        Ok(agent::find_all(&self.pool, &self.owner_id).await?)
    }

    pub async fn agent(&self, id: i64) -> AppResult<Option<Agent>> {
        Ok(agent::find_by_id(&self.pool, &self.owner_id, id).await?)
    }

    pub async fn agent_by_phone(&self, phone: &str) -> AppResult<Option<Agent>> {
        Ok(agent::find_by_phone(&self.pool, &self.owner_id, phone).await?)
    }

    /// Insert an agent and append it to the agent id cache of its villages
    ///
    /// `data.pin` is not stored; `pin_hash` is.
    pub async fn insert_agent(&self, data: AgentCreate, pin_hash: String) -> AppResult<Agent> {
        let now = now_millis();
        let record = Agent {
            id: snowflake_id(),
            owner_id: self.owner_id.clone(),
            phone: data.phone.trim().to_string(),
            pin_hash,
            name: data.name,
            assigned_villages: data.assigned_villages,
            created_at: now,
            updated_at: now,
        };

        // agent id cache per assigned village, resolved before the write
        let mut village_caches = Vec::with_capacity(record.assigned_villages.len());
        for village_id in &record.assigned_villages {
            let cached = village::find_by_id(&self.pool, &self.owner_id, *village_id)
                .await?
                .ok_or_else(|| {
                    AppError::new(ErrorCode::VillageNotFound).with_detail("id", *village_id)
                })?;
            let mut agent_ids = cached.agent_ids;
            if !agent_ids.contains(&record.id) {
                agent_ids.push(record.id);
            }
            village_caches.push((*village_id, agent_ids));
        }

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        agent::insert(&mut *tx, &record).await?;
        for (village_id, agent_ids) in &village_caches {
            village::set_agent_ids(&mut *tx, &self.owner_id, *village_id, agent_ids).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        Ok(record)
    }

    /// Partial agent update
    ///
    /// A new village assignment must name existing villages. The agent id
    /// cache of every village leaving or joining the assignment is rewritten
    /// in the same transaction as the agent row.
    pub async fn update_agent(&self, id: i64, data: AgentUpdate) -> AppResult<Agent> {
        let current = self
            .agent(id)
            .await?
            .ok_or_else(|| AppError::new(ErrorCode::AgentNotFound).with_detail("id", id))?;

        let mut village_caches = Vec::new();
        if let Some(assigned) = &data.assigned_villages {
            for village_id in assigned {
                let joined = village::find_by_id(&self.pool, &self.owner_id, *village_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::VillageNotFound).with_detail("id", *village_id)
                    })?;
                if !joined.agent_ids.contains(&id) {
                    let mut agent_ids = joined.agent_ids;
                    agent_ids.push(id);
                    village_caches.push((joined.id, agent_ids));
                }
            }
            for village_id in current.assigned_villages.iter().filter(|v| !assigned.contains(*v)) {
                // villages removed from the device since assignment have no cache left
                let Some(left) = village::find_by_id(&self.pool, &self.owner_id, *village_id).await?
                else {
                    continue;
                };
                let agent_ids: Vec<i64> = left.agent_ids.into_iter().filter(|a| *a != id).collect();
                village_caches.push((left.id, agent_ids));
            }
        }

        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let updated = agent::update(&mut *tx, &self.owner_id, id, data)
            .await
            .map_err(|e| match e {
                RepoError::NotFound(_) => AppError::new(ErrorCode::AgentNotFound).with_detail("id", id),
                other => other.into(),
            })?;
        for (village_id, agent_ids) in &village_caches {
            village::set_agent_ids(&mut *tx, &self.owner_id, *village_id, agent_ids).await?;
        }
        tx.commit().await.map_err(RepoError::from)?;

        Ok(updated)
    }

    pub async fn put_agent(&self, record: &Agent) -> AppResult<()> {
        self.check_partition("agent", record.id, &record.owner_id)?;
        Ok(agent::put(&self.pool, record).await?)
    }

    // ==================== Customers ====================

    pub async fn customers(&self) -> AppResult<Vec<Customer>> {
        Ok(customer::find_all(&self.pool, &self.owner_id).await?)
    }

    pub async fn customer(&self, id: i64) -> AppResult<Option<Customer>> {
        Ok(customer::find_by_id(&self.pool, &self.owner_id, id).await?)
    }

    pub async fn customers_in_village(&self, village_id: i64) -> AppResult<Vec<Customer>> {
        Ok(customer::find_by_village(&self.pool, &self.owner_id, village_id).await?)
    }

    pub async fn customer_by_number(
        &self,
        village_id: i64,
        customer_number: i64,
    ) -> AppResult<Option<Customer>> {
        Ok(customer::find_by_number(&self.pool, &self.owner_id, village_id, customer_number).await?)
    }

    pub async fn count_customers(&self) -> AppResult<i64> {
        Ok(customer::count(&self.pool, &self.owner_id).await?)
    }

    pub async fn count_customers_in_villages(&self, village_ids: &[i64]) -> AppResult<i64> {
        Ok(customer::count_in_villages(&self.pool, &self.owner_id, village_ids).await?)
    }

    /// Insert a customer with the next free number of its village
    pub async fn insert_customer(&self, data: CustomerCreate) -> AppResult<Customer> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;
        let record = self.new_customer_in(&mut tx, data).await?;
        tx.commit().await.map_err(RepoError::from)?;
        Ok(record)
    }

    async fn new_customer_in(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        data: CustomerCreate,
    ) -> AppResult<Customer> {
        let now = now_millis();
        let customer_number = customer::next_number(&mut **tx, &self.owner_id, data.village_id).await?;
        let record = Customer {
            id: snowflake_id(),
            owner_id: self.owner_id.clone(),
            village_id: data.village_id,
            customer_number,
            name: data.name,
            phone: data.phone,
            address: data.address,
            created_at: now,
            updated_at: now,
        };
        customer::insert(&mut **tx, &record).await?;
        Ok(record)
    }

    pub async fn update_customer(&self, id: i64, data: CustomerUpdate) -> AppResult<Customer> {
        customer::update(&self.pool, &self.owner_id, id, data)
            .await
            .map_err(|e| match e {
                RepoError::NotFound(_) => {
                    AppError::new(ErrorCode::CustomerNotFound).with_detail("id", id)
                }
                other => other.into(),
            })
    }

    pub async fn put_customer(&self, record: &Customer) -> AppResult<()> {
        self.check_partition("customer", record.id, &record.owner_id)?;
        Ok(customer::put(&self.pool, record).await?)
    }

    // ==================== Sales ====================

    pub async fn sales(&self) -> AppResult<Vec<Sale>> {
        Ok(sale::find_all(&self.pool, &self.owner_id).await?)
    }

    pub async fn sale(&self, id: i64) -> AppResult<Option<Sale>> {
        Ok(sale::find_by_id(&self.pool, &self.owner_id, id).await?)
    }

    pub async fn sales_for_customer(&self, customer_id: i64) -> AppResult<Vec<Sale>> {
        Ok(sale::find_by_customer(&self.pool, &self.owner_id, customer_id).await?)
    }

    /// Active sales of a customer in collection order
    pub async fn active_sales_for_customer(&self, customer_id: i64) -> AppResult<Vec<Sale>> {
        Ok(sale::find_active_by_customer(&self.pool, &self.owner_id, customer_id).await?)
    }

    pub async fn active_sales_in_village(&self, village_id: i64) -> AppResult<Vec<Sale>> {
        Ok(sale::find_active_by_village(&self.pool, &self.owner_id, village_id).await?)
    }

    pub async fn due_sales(&self, now: i64) -> AppResult<Vec<Sale>> {
        Ok(sale::find_due(&self.pool, &self.owner_id, now).await?)
    }

    pub async fn pending_sales(&self) -> AppResult<Vec<Sale>> {
        Ok(sale::find_by_sync_status(&self.pool, &self.owner_id, SyncStatus::Pending).await?)
    }

    pub async fn count_sales(&self, status: SaleStatus) -> AppResult<i64> {
        Ok(sale::count_by_status(&self.pool, &self.owner_id, status).await?)
    }

    /// Insert a new active sale, creating its customer first when inline
    ///
    /// Both rows are written in one transaction. Field validation is the
    /// caller's job (see `services::admin`).
    pub async fn insert_sale(&self, data: SaleCreate) -> AppResult<(Sale, Customer)> {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let buyer = match data.customer {
            SaleCustomer::Existing { customer_id } => {
                customer::find_by_id(&mut *tx, &self.owner_id, customer_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::new(ErrorCode::CustomerNotFound).with_detail("id", customer_id)
                    })?
            }
            SaleCustomer::New {
                name,
                phone,
                address,
            } => {
                self.new_customer_in(
                    &mut tx,
                    CustomerCreate {
                        village_id: data.village_id,
                        name,
                        phone,
                        address,
                    },
                )
                .await?
            }
        };

        let now = now_millis();
        let record = Sale {
            id: snowflake_id(),
            owner_id: self.owner_id.clone(),
            village_id: data.village_id,
            customer_id: buyer.id,
            product_id: data.product_id,
            down_payment: data.down_payment,
            emi_amount: data.emi_amount,
            frequency: data.frequency,
            total_emis: data.total_emis,
            emis_collected: 0,
            start_date: data.start_date,
            next_due_date: data.start_date,
            status: SaleStatus::Active,
            assigned_agent_id: data.assigned_agent_id,
            created_at: now,
            updated_at: now,
            sync_status: SyncStatus::Pending,
        };
        sale::insert(&mut *tx, &record).await?;
        tx.commit().await.map_err(RepoError::from)?;

        Ok((record, buyer))
    }

    pub async fn put_sale(&self, record: &Sale) -> AppResult<()> {
        self.check_partition("sale", record.id, &record.owner_id)?;
        Ok(sale::put(&self.pool, record).await?)
    }

    /// Mark `pushed` synced if the row still holds the pushed state
    ///
    /// Returns false when the sale was advanced after `pushed` was read.
    pub async fn mark_sale_synced(&self, pushed: &Sale) -> AppResult<bool> {
        self.check_partition("sale", pushed.id, &pushed.owner_id)?;
        Ok(sale::mark_synced(&self.pool, pushed).await?)
    }

    // ==================== Payments ====================

    pub async fn payments(&self) -> AppResult<Vec<Payment>> {
        Ok(payment::find_all(&self.pool, &self.owner_id).await?)
    }

    pub async fn payment(&self, id: i64) -> AppResult<Option<Payment>> {
        Ok(payment::find_by_id(&self.pool, &self.owner_id, id).await?)
    }

    pub async fn pending_payments(&self) -> AppResult<Vec<Payment>> {
        Ok(payment::find_by_sync_status(&self.pool, &self.owner_id, SyncStatus::Pending).await?)
    }

    pub async fn count_payments(&self) -> AppResult<i64> {
        Ok(payment::count(&self.pool, &self.owner_id).await?)
    }

    pub async fn total_collected(&self) -> AppResult<f64> {
        Ok(payment::total_amount(&self.pool, &self.owner_id).await?)
    }

    pub async fn put_payment(&self, record: &Payment) -> AppResult<()> {
        self.check_partition("payment", record.id, &record.owner_id)?;
        Ok(payment::put(&self.pool, record).await?)
    }

    pub async fn mark_payment_synced(&self, id: i64) -> AppResult<bool> {
        Ok(payment::set_sync_status(&self.pool, &self.owner_id, id, SyncStatus::Synced).await?)
    }

    // ==================== Collection ====================

    /// Record one collection against the customer's first active sale
    ///
    /// Inside a single transaction: load the customer's active sales in
    /// collection order, let `build` produce the payment and the advanced
    /// sale from the head, insert the payment and persist the sale. Any
    /// error rolls both writes back.
    pub async fn record_collection<F>(&self, customer_id: i64, build: F) -> AppResult<(Payment, Sale)>
    where
        F: FnOnce(&Sale) -> AppResult<(Payment, Sale)>,
    {
        let mut tx = self.pool.begin().await.map_err(RepoError::from)?;

        let active = sale::find_active_by_customer(&mut *tx, &self.owner_id, customer_id).await?;
        let Some(current) = active.first() else {
            return Err(AppError::new(ErrorCode::NoActiveSale).with_detail("customer_id", customer_id));
        };
        if active.len() > 1 {
            tracing::warn!(
                owner_id = %self.owner_id,
                customer_id,
                active = active.len(),
                sale_id = current.id,
                "Customer has several active sales, collecting against the earliest due"
            );
        }

        let (new_payment, advanced) = build(current)?;
        payment::insert(&mut *tx, &new_payment).await?;
        sale::update_schedule(&mut *tx, &advanced)
            .await
            .map_err(|e| match e {
                RepoError::NotFound(_) => {
                    AppError::new(ErrorCode::SaleNotFound).with_detail("id", advanced.id)
                }
                other => other.into(),
            })?;
        tx.commit().await.map_err(RepoError::from)?;

        Ok((new_payment, advanced))
    }

    // ==================== Read accessors ====================

    /// Number of sales plus payments awaiting push
    pub async fn pending_count(&self) -> AppResult<i64> {
        let sales =
            sale::count_by_sync_status(&self.pool, &self.owner_id, SyncStatus::Pending).await?;
        let payments =
            payment::count_by_sync_status(&self.pool, &self.owner_id, SyncStatus::Pending).await?;
        Ok(sales + payments)
    }

    /// All six collections of this partition
    pub async fn snapshot(&self) -> AppResult<OwnerSnapshot> {
        Ok(OwnerSnapshot {
            sales: self.sales().await?,
            payments: self.payments().await?,
            villages: self.villages().await?,
            customers: self.customers().await?,
            products: self.products().await?,
            agents: self.agents().await?,
        })
    }
}
