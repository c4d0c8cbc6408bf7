//! Owner Repository

use super::{RepoError, RepoResult};
use shared::models::Owner;
use sqlx::SqlitePool;

pub async fn find_by_external_uid(pool: &SqlitePool, external_uid: &str) -> RepoResult<Option<Owner>> {
    let owner = sqlx::query_as::<_, Owner>(
        "SELECT id, external_uid, email, name, created_at FROM owner WHERE external_uid = ?",
    )
    .bind(external_uid)
    .fetch_optional(pool)
    .await?;
    Ok(owner)
}

/// Insert the owner row or refresh its email/name (keyed by external uid)
pub async fn upsert(
    pool: &SqlitePool,
    external_uid: &str,
    email: &str,
    name: Option<&str>,
) -> RepoResult<Owner> {
    let now = shared::util::now_millis();
    sqlx::query(
        "INSERT INTO owner (id, external_uid, email, name, created_at) VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(external_uid) DO UPDATE SET email = excluded.email, name = COALESCE(excluded.name, owner.name)",
    )
    .bind(shared::util::snowflake_id())
    .bind(external_uid)
    .bind(email)
    .bind(name)
    .bind(now)
    .execute(pool)
    .await?;
    find_by_external_uid(pool, external_uid)
        .await?
        .ok_or_else(|| RepoError::Database("Failed to upsert owner".into()))
}
