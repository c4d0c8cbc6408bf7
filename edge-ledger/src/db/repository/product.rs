//! Product Repository

use super::RepoResult;
use shared::models::Product;
use sqlx::SqlitePool;

pub async fn find_all(pool: &SqlitePool, owner_id: &str) -> RepoResult<Vec<Product>> {
    let products = sqlx::query_as::<_, Product>(
        "SELECT id, owner_id, name, created_at FROM product WHERE owner_id = ? ORDER BY name",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(products)
}

pub async fn find_by_id(pool: &SqlitePool, owner_id: &str, id: i64) -> RepoResult<Option<Product>> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, owner_id, name, created_at FROM product WHERE owner_id = ? AND id = ?",
    )
    .bind(owner_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(product)
}

pub async fn insert(pool: &SqlitePool, product: &Product) -> RepoResult<()> {
    sqlx::query("INSERT INTO product (id, owner_id, name, created_at) VALUES (?1, ?2, ?3, ?4)")
        .bind(product.id)
        .bind(&product.owner_id)
        .bind(&product.name)
        .bind(product.created_at)
        .execute(pool)
        .await?;
    Ok(())
}

/// Insert-or-replace with the caller's id
pub async fn put(pool: &SqlitePool, product: &Product) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO product (id, owner_id, name, created_at) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, name = excluded.name, created_at = excluded.created_at",
    )
    .bind(product.id)
    .bind(&product.owner_id)
    .bind(&product.name)
    .bind(product.created_at)
    .execute(pool)
    .await?;
    Ok(())
}
