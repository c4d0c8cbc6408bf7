//! Payment Repository
//!
//! Payments are append-only: no update path except the sync flag.

use super::RepoResult;
use shared::models::{Payment, SyncStatus};
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, owner_id, sale_id, amount, collected_by_agent_id, collected_at, created_at, sync_status";

pub async fn find_all(pool: &SqlitePool, owner_id: &str) -> RepoResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payment WHERE owner_id = ? ORDER BY collected_at, id"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(payments)
}

pub async fn find_by_id(pool: &SqlitePool, owner_id: &str, id: i64) -> RepoResult<Option<Payment>> {
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payment WHERE owner_id = ? AND id = ?"
    ))
    .bind(owner_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(payment)
}

pub async fn find_by_sync_status(
    pool: &SqlitePool,
    owner_id: &str,
    sync_status: SyncStatus,
) -> RepoResult<Vec<Payment>> {
    let payments = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {COLUMNS} FROM payment WHERE owner_id = ? AND sync_status = ? ORDER BY created_at, id"
    ))
    .bind(owner_id)
    .bind(sync_status)
    .fetch_all(pool)
    .await?;
    Ok(payments)
}

pub async fn count(pool: &SqlitePool, owner_id: &str) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM payment WHERE owner_id = ?")
        .bind(owner_id)
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
        "SELECT COUNT(*) FROM payment WHERE owner_id = ? AND sync_status = ?",
    )
    .bind(owner_id)
    .bind(sync_status)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

pub async fn total_amount(pool: &SqlitePool, owner_id: &str) -> RepoResult<f64> {
    let total = sqlx::query_scalar::<_, f64>(
        "SELECT COALESCE(SUM(amount), 0.0) FROM payment WHERE owner_id = ?",
    )
    .bind(owner_id)
    .fetch_one(pool)
    .await?;
    Ok(total)
}

pub async fn insert<'e, E>(executor: E, payment: &Payment) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(&format!(
        "INSERT INTO payment ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ))
    .bind(payment.id)
    .bind(&payment.owner_id)
    .bind(payment.sale_id)
    .bind(payment.amount)
    .bind(payment.collected_by_agent_id)
    .bind(payment.collected_at)
    .bind(payment.created_at)
    .bind(payment.sync_status)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert-or-replace with the caller's id (pull path)
pub async fn put(pool: &SqlitePool, payment: &Payment) -> RepoResult<()> {
    sqlx::query(&format!(
        "INSERT INTO payment ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, sale_id = excluded.sale_id, \
         amount = excluded.amount, collected_by_agent_id = excluded.collected_by_agent_id, \
         collected_at = excluded.collected_at, created_at = excluded.created_at, sync_status = excluded.sync_status"
    ))
    .bind(payment.id)
    .bind(&payment.owner_id)
    .bind(payment.sale_id)
    .bind(payment.amount)
    .bind(payment.collected_by_agent_id)
    .bind(payment.collected_at)
    .bind(payment.created_at)
    .bind(payment.sync_status)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn set_sync_status(
    pool: &SqlitePool,
    owner_id: &str,
    id: i64,
    sync_status: SyncStatus,
) -> RepoResult<bool> {
    let rows = sqlx::query("UPDATE payment SET sync_status = ? WHERE owner_id = ? AND id = ?")
        .bind(sync_status)
        .bind(owner_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(rows.rows_affected() > 0)
}
