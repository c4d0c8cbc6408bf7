//! Agent Repository

use super::{RepoError, RepoResult};
use shared::models::{Agent, AgentUpdate};
use sqlx::SqlitePool;
use sqlx::types::Json;

const COLUMNS: &str =
    "id, owner_id, phone, pin_hash, name, assigned_villages, created_at, updated_at";

pub async fn find_all(pool: &SqlitePool, owner_id: &str) -> RepoResult<Vec<Agent>> {
    let agents = sqlx::query_as::<_, Agent>(&format!(
        "SELECT {COLUMNS} FROM agent WHERE owner_id = ? ORDER BY name"
    ))
    .bind(owner_id)
    .fetch_all(pool)
    .await?;
    Ok(agents)
}

pub async fn find_by_id(pool: &SqlitePool, owner_id: &str, id: i64) -> RepoResult<Option<Agent>> {
    let agent = sqlx::query_as::<_, Agent>(&format!(
        "SELECT {COLUMNS} FROM agent WHERE owner_id = ? AND id = ?"
    ))
    .bind(owner_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(agent)
}

pub async fn find_by_phone(
    pool: &SqlitePool,
    owner_id: &str,
    phone: &str,
) -> RepoResult<Option<Agent>> {
    let agent = sqlx::query_as::<_, Agent>(&format!(
        "SELECT {COLUMNS} FROM agent WHERE owner_id = ? AND phone = ? ORDER BY created_at LIMIT 1"
    ))
    .bind(owner_id)
    .bind(phone)
    .fetch_optional(pool)
    .await?;
    Ok(agent)
}

/// Device-level phone lookup across owners (agent login, before the
/// partition is known). Oldest record first.
pub async fn find_any_by_phone(pool: &SqlitePool, phone: &str) -> RepoResult<Vec<Agent>> {
    let agents = sqlx::query_as::<_, Agent>(&format!(
        "SELECT {COLUMNS} FROM agent WHERE phone = ? ORDER BY created_at, id"
    ))
    .bind(phone)
    .fetch_all(pool)
    .await?;
    Ok(agents)
}

pub async fn insert<'e, E>(executor: E, agent: &Agent) -> RepoResult<()>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query(&format!(
        "INSERT INTO agent ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
    ))
    .bind(agent.id)
    .bind(&agent.owner_id)
    .bind(&agent.phone)
    .bind(&agent.pin_hash)
    .bind(&agent.name)
    .bind(Json(&agent.assigned_villages))
    .bind(agent.created_at)
    .bind(agent.updated_at)
    .execute(executor)
    .await?;
    Ok(())
}

/// Insert-or-replace with the caller's id
pub async fn put(pool: &SqlitePool, agent: &Agent) -> RepoResult<()> {
    sqlx::query(&format!(
        "INSERT INTO agent ({COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT(id) DO UPDATE SET owner_id = excluded.owner_id, phone = excluded.phone, \
         pin_hash = excluded.pin_hash, name = excluded.name, assigned_villages = excluded.assigned_villages, \
         created_at = excluded.created_at, updated_at = excluded.updated_at"
    ))
    .bind(agent.id)
    .bind(&agent.owner_id)
    .bind(&agent.phone)
    .bind(&agent.pin_hash)
    .bind(&agent.name)
    .bind(Json(&agent.assigned_villages))
    .bind(agent.created_at)
    .bind(agent.updated_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Partial update; `None` fields keep their stored value
pub async fn update<'e, E>(executor: E, owner_id: &str, id: i64, data: AgentUpdate) -> RepoResult<Agent>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    let now = shared::util::now_millis();
    sqlx::query_as::<_, Agent>(&format!(
        "UPDATE agent SET name = COALESCE(?1, name), assigned_villages = COALESCE(?2, assigned_villages), updated_at = ?3 \
         WHERE owner_id = ?4 AND id = ?5 RETURNING {COLUMNS}"
    ))
    .bind(data.name)
    .bind(data.assigned_villages.map(Json))
    .bind(now)
    .bind(owner_id)
    .bind(id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| RepoError::NotFound(format!("Agent {id} not found")))
}
