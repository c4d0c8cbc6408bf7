//! Customer Repository

use super::{RepoError, RepoResult};
use shared::models::{Customer, CustomerUpdate};
use sqlx::SqlitePool;

const COLUMNS: &str =
    "id, owner_id, village_id, customer_number, name, phone, address, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool, owner_id: &str) -> RepoResult<Vec<Customer>> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer WHERE owner_id = ? ORDER BY village_id, customer_number"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(customers)
}

pub async fn find_by_id<'e, E>(executor: E, owner_id: &str, id: i64) -> RepoResult<Option<Customer>>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer WHERE owner_id = ? AND id = ?"
    ))
    .bind(owner_id)
    .bind(id)
    .fetch_optional(executor)
    .await?;
    Ok(customer)
}

pub async fn find_by_village(
    pool: &SqlitePool,
    owner_id: &str,
    village_id: i64,
) -> RepoResult<Vec<Customer>> {
    let customers = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer WHERE owner_id = ? AND village_id = ? ORDER BY customer_number"
    ))
    .bind(owner_id)
    .bind(village_id)
    .fetch_all(pool)
    .await?;
    Ok(customers)
}

pub async fn find_by_number(
    pool: &SqlitePool,
    owner_id: &str,
    village_id: i64,
    customer_number: i64,
) -> RepoResult<Option<Customer>> {
    let customer = sqlx::query_as::<_, Customer>(&format!(
        "SELECT {COLUMNS} FROM customer WHERE owner_id = ? AND village_id = ? AND customer_number = ? \
         ORDER BY created_at, id LIMIT 1"
    ))
    .bind(owner_id)
    .bind(village_id)
    .bind(customer_number)
    .fetch_optional(pool)
    .await?;
    Ok(customer)
}

/// Number of customers living in any of `village_ids`
pub async fn count_in_villages(
    pool: &SqlitePool,
    owner_id: &str,
    village_ids: &[i64],
) -> RepoResult<i64> {
    if village_ids.is_empty() {
        return Ok(0);
    }
    let placeholders = vec!["?"; village_ids.len()].join(", ");
    let sql = format!(
        "SELECT COUNT(*) FROM customer WHERE owner_id = ? AND village_id IN ({placeholders})"
    );
    let mut query = sqlx::query_scalar::<_, i64>(&sql).bind(owner_id);
    for id in village_ids {
        query = query.bind(*id);
    }
    Ok(query.fetch_one(pool).await?)
}

pub async fn count(pool: &SqlitePool, owner_id: &str) -> RepoResult<i64> {
    let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM customer WHERE owner_id = ?")
        .bind(owner_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Next free customer number in a village (1 for an empty village)
pub async fn next_number<'e, E>(executor: E, owner_id: &str, village_id: i64) -> RepoResult<i64>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let max = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(customer_number) FROM customer WHERE owner_id = ? AND village_id = ?",
    )
    .bind(owner_id)
    .bind(village_id)
    .fetch_one(executor)
    .await?;
    Ok(max.unwrap_or(0) + 1)
}

pub async fn insert<'e, E>(executor: E, customer: &Customer) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(&format!(
        "INSERT INTO customer ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
    ))
    .bind(customer.id)
    .bind(&customer.owner_id)
    .bind(customer.village_id)
    .bind(customer.customer_number)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert-or-replace with the caller's id
pub async fn put(pool: &SqlitePool, customer: &Customer) -> RepoResult<()> {
    sqlx::query(&format!(
        "INSERT INTO customer ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) \
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, village_id = excluded.village_id, \
         customer_number = excluded.customer_number, name = excluded.name, phone = excluded.phone, \
         address = excluded.address, created_at = excluded.created_at, updated_at = excluded.updated_at"
    ))
    .bind(customer.id)
    .bind(&customer.owner_id)
    .bind(customer.village_id)
    .bind(customer.customer_number)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Partial update; `None` fields keep their stored value
pub async fn update(
    pool: &SqlitePool,
    owner_id: &str,
    id: i64,
    data: CustomerUpdate,
) -> RepoResult<Customer> {
    let now = shared::util::now_millis();
    sqlx::query_as::<_, Customer>(&format!(
        "UPDATE customer SET name = COALESCE(?1, name), phone = COALESCE(?2, phone), address = COALESCE(?3, address), \
         updated_at = ?4 WHERE owner_id = ?5 AND id = ?6 RETURNING {COLUMNS}"
    ))
    .bind(data.name)
    .bind(data.phone)
    .bind(data.address)
    .bind(now)
    .bind(owner_id)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Customer {id} not found")))
}
