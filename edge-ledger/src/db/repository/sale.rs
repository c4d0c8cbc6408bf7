//! Sale Repository

use super::{RepoError, RepoResult};
use shared::models::{Sale, SaleStatus, SyncStatus};
use sqlx::SqlitePool;

const COLUMNS: &str = "id, owner_id, village_id, customer_id, product_id, down_payment, emi_amount, \
     frequency, total_emis, emis_collected, start_date, next_due_date, status, assigned_agent_id, \
     created_at, updated_at, sync_status";

const VALUES: &str = "?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17";

pub async fn find_all(pool: &SqlitePool, owner_id: &str) -> RepoResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? ORDER BY created_at, id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

pub async fn find_by_id(pool: &SqlitePool, owner_id: &str, id: i64) -> RepoResult<Option<Sale>> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? AND id = ?"
    ))
    .bind(owner_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(sale)
}

pub async fn find_by_customer(
    pool: &SqlitePool,
    owner_id: &str,
    customer_id: i64,
) -> RepoResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? AND customer_id = ? ORDER BY created_at, id"
    ))
    .bind(owner_id)
    .bind(customer_id)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

/// Active sales of a customer, earliest due first (ties: lowest id)
///
/// The head of this list is the sale a collection applies to.
pub async fn find_active_by_customer<'e, E>(
    executor: E,
    owner_id: &str,
    customer_id: i64,
) -> RepoResult<Vec<Sale>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? AND customer_id = ? AND status = ? \
         ORDER BY next_due_date, id"
    ))
    .bind(owner_id)
    .bind(customer_id)
    .bind(SaleStatus::Active)
    .fetch_all(executor)
    .await?;
    Ok(sales)
}

pub async fn find_active_by_village(
    pool: &SqlitePool,
    owner_id: &str,
    village_id: i64,
) -> RepoResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? AND village_id = ? AND status = ? \
         ORDER BY next_due_date, id"
    ))
    .bind(owner_id)
    .bind(village_id)
    .bind(SaleStatus::Active)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

/// Active sales with `next_due_date <= now`
pub async fn find_due(pool: &SqlitePool, owner_id: &str, now: i64) -> RepoResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? AND status = ? AND next_due_date <= ? \
         ORDER BY next_due_date, id"
    ))
    .bind(owner_id)
    .bind(SaleStatus::Active)
    .bind(now)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

pub async fn find_by_sync_status(
    pool: &SqlitePool,
    owner_id: &str,
    sync_status: SyncStatus,
) -> RepoResult<Vec<Sale>> {
    let sales = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {COLUMNS} FROM sale WHERE owner_id = ? AND sync_status = ? ORDER BY updated_at, id"
    ))
    .bind(owner_id)
    .bind(sync_status)
    .fetch_all(pool)
    .await?;
    Ok(sales)
}

pub async fn count_by_status(pool: &SqlitePool, owner_id: &str, status: SaleStatus) -> RepoResult<i64> {
    let count =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sale WHERE owner_id = ? AND status = ?")
            .bind(owner_id)
            .bind(status)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

pub async fn count_by_sync_status(
    pool: &SqlitePool,
    owner_id: &str,
    sync_status: SyncStatus,
) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM sale WHERE owner_id = ? AND sync_status = ?",
    )
    .bind(owner_id)
    .bind(sync_status)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn insert<'e, E>(executor: E, sale: &Sale) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    bind_all(sqlx::query(&format!(
        "INSERT INTO sale ({COLUMNS}) VALUES ({VALUES})"
    )), sale)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert-or-replace with the caller's id (pull path)
pub async fn put(pool: &SqlitePool, sale: &Sale) -> RepoResult<()> {
    bind_all(
        sqlx::query(&format!(
            "INSERT INTO sale ({COLUMNS}) VALUES ({VALUES}) \
             ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, village_id = excluded.village_id, \
             customer_id = excluded.customer_id, product_id = excluded.product_id, \
             down_payment = excluded.down_payment, emi_amount = excluded.emi_amount, \
             frequency = excluded.frequency, total_emis = excluded.total_emis, \
             emis_collected = excluded.emis_collected, start_date = excluded.start_date, \
             next_due_date = excluded.next_due_date, status = excluded.status, \
             assigned_agent_id = excluded.assigned_agent_id, created_at = excluded.created_at, \
             updated_at = excluded.updated_at, sync_status = excluded.sync_status"
        )),
        sale,
    )
    .execute(pool)
    .await?;
    Ok(())
}

/// Persist the schedule fields of an advanced sale and mark it pending
pub async fn update_schedule<'e, E>(executor: E, sale: &Sale) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let rows = sqlx::query(
        "UPDATE sale SET emis_collected = ?1, next_due_date = ?2, status = ?3, updated_at = ?4, sync_status = ?5 \
         WHERE owner_id = ?6 AND id = ?7",
    )
    .bind(sale.emis_collected)
    .bind(sale.next_due_date)
    .bind(sale.status)
    .bind(sale.updated_at)
    .bind(SyncStatus::Pending)
    .bind(&sale.owner_id)
    .bind(sale.id)
    .execute(executor)
    .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Sale {} not found", sale.id)));
    }
    Ok(())
}

/// Flip a pushed sale to synced unless it changed after the snapshot was read
///
/// Compare-and-set on the schedule fields the collection path writes. No
/// match means a newer local state exists; the row stays pending.
pub async fn mark_synced(pool: &SqlitePool, pushed: &Sale) -> RepoResult<bool> {
    let rows = sqlx::query(
        "UPDATE sale SET sync_status = ?1 \
         WHERE owner_id = ?2 AND id = ?3 AND updated_at = ?4 AND emis_collected = ?5 AND status = ?6",
    )
    .bind(SyncStatus::Synced)
    .bind(&pushed.owner_id)
    .bind(pushed.id)
    .bind(pushed.updated_at)
    .bind(pushed.emis_collected)
    .bind(pushed.status)
    .execute(pool)
    .await?;
    Ok(rows.rows_affected() > 0)
}

fn bind_all<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>>,
    sale: &'q Sale,
) -> sqlx::query::Query<'q, sqlx::Sqlite, sqlx::sqlite::SqliteArguments<'q>> {
    query
        .bind(sale.id)
        .bind(&sale.owner_id)
        .bind(sale.village_id)
        .bind(sale.customer_id)
        .bind(sale.product_id)
        .bind(sale.down_payment)
        .bind(sale.emi_amount)
        .bind(sale.frequency)
        .bind(sale.total_emis)
        .bind(sale.emis_collected)
        .bind(sale.start_date)
        .bind(sale.next_due_date)
        .bind(sale.status)
        .bind(sale.assigned_agent_id)
        .bind(sale.created_at)
        .bind(sale.updated_at)
        .bind(sale.sync_status)
}
