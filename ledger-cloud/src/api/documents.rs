//! Document API: per-owner collections of JSON documents
//!
//! - `PUT /api/owners/{owner_id}/{collection}/{doc_id}` upserts one document
//! - `GET /api/owners/{owner_id}/{collection}` returns `[{id, fields}]`

use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde_json::{Map, Value};
use shared::cloud::{Collection, RemoteDocument};

use crate::auth::OwnerIdentity;
use crate::db::documents;
use crate::error::ServiceResult;
use crate::state::AppState;

pub async fn put_document(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Path((owner_id, collection, doc_id)): Path<(String, Collection, String)>,
    Json(fields): Json<Map<String, Value>>,
) -> ServiceResult<Json<Value>> {
    identity.check_partition(&owner_id)?;

    documents::upsert(
        &state.pool,
        &owner_id,
        collection,
        &doc_id,
        &fields,
        shared::util::now_millis(),
    )
    .await?;

    tracing::debug!(owner_id = %owner_id, collection = %collection, doc_id = %doc_id, "Document written");
    Ok(Json(serde_json::json!({ "id": doc_id })))
}

pub async fn list_documents(
    State(state): State<AppState>,
    Extension(identity): Extension<OwnerIdentity>,
    Path((owner_id, collection)): Path<(String, Collection)>,
) -> ServiceResult<Json<Vec<RemoteDocument>>> {
    identity.check_partition(&owner_id)?;

    let docs = documents::list(&state.pool, &owner_id, collection).await?;
    tracing::debug!(owner_id = %owner_id, collection = %collection, count = docs.len(), "Collection listed");
    Ok(Json(docs))
}
