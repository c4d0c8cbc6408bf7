//! Village Repository

use super::{RepoError, RepoResult};
use shared::models::Village;
use sqlx::SqlitePool;
use sqlx::types::Json;

pub async fn find_all(pool: &SqlitePool, owner_id: &str) -> RepoResult<Vec<Village>> {
    let villages = sqlx::query_as::<_, Village>(
        "SELECT id, owner_id, name, agent_ids, created_at FROM village WHERE owner_id = ? ORDER BY name",
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(villages)
}

pub async fn find_by_id(pool: &SqlitePool, owner_id: &str, id: i64) -> RepoResult<Option<Village>> {
    let village = sqlx::query_as::<_, Village>(
        "SELECT id, owner_id, name, agent_ids, created_at FROM village WHERE owner_id = ? AND id = ?",
    )
    .bind(owner_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(village)
}

pub async fn insert<'e, E>(executor: E, village: &Village) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(
        "INSERT INTO village (id, owner_id, name, agent_ids, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
    )
    .bind(village.id)
    .bind(&village.owner_id)
    .bind(&village.name)
    .bind(Json(&village.agent_ids))
    .bind(village.created_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert-or-replace with the caller's id
pub async fn put(pool: &SqlitePool, village: &Village) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO village (id, owner_id, name, agent_ids, created_at) VALUES (?1, ?2, ?3, ?4, ?5) \
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, name = excluded.name, \
         agent_ids = excluded.agent_ids, created_at = excluded.created_at",
    )
    .bind(village.id)
    .bind(&village.owner_id)
    .bind(&village.name)
    .bind(Json(&village.agent_ids))
    .bind(village.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Replace the cached agent id list of one village
pub async fn set_agent_ids<'e, E>(
    executor: E,
    owner_id: &str,
    id: i64,
    agent_ids: &[i64],
) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let rows = sqlx::query("UPDATE village SET agent_ids = ?1 WHERE owner_id = ?2 AND id = ?3")
        .bind(Json(agent_ids))
        .bind(owner_id)
        .bind(id)
        .execute(executor)
        .await?;
    if rows.rows_affected() == 0 {
        return Err(RepoError::NotFound(format!("Village {id} not found")));
    }
    Ok(())
}
