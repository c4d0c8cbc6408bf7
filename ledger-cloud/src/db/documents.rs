//! Document storage: one JSONB row per owner / collection / document id

use serde_json::{Map, Value};
use shared::cloud::{Collection, RemoteDocument};
use sqlx::PgPool;
use sqlx::types::Json;

/// Insert or overwrite a document (last write wins)
pub async fn upsert(
    pool: &PgPool,
    owner_id: &str,
    collection: Collection,
    doc_id: &str,
    fields: &Map<String, Value>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO documents (owner_id, collection, doc_id, fields, updated_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (owner_id, collection, doc_id)
        DO UPDATE SET fields = EXCLUDED.fields, updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(owner_id)
    .bind(collection.as_str())
    .bind(doc_id)
    .bind(Json(fields))
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Full collection of one owner partition
pub async fn list(
    pool: &PgPool,
    owner_id: &str,
    collection: Collection,
) -> Result<Vec<RemoteDocument>, sqlx::Error> {
    let rows: Vec<(String, Json<Map<String, Value>>)> = sqlx::query_as(
        "SELECT doc_id, fields FROM documents
         WHERE owner_id = $1 AND collection = $2
         ORDER BY doc_id",
    )
    .bind(owner_id)
    .bind(collection.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(doc_id, Json(fields))| RemoteDocument::new(doc_id, fields))
        .collect())
}
