//! Local record ↔ remote document translation
//!
//! Encoding drops `id` (it is the document id) and the local-only
//! `syncStatus`, and turns millisecond date fields into remote timestamps.
//! Decoding reverses that, restores `id` from the document id and, for
//! sales/payments, forces `syncStatus = synced`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use shared::cloud::{Collection, RemoteDocument, RemoteTimestamp};
use shared::error::{AppError, ErrorCode};
use shared::models::SyncStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("document id {0:?} is not a local numeric id")]
    NonNumericId(String),

    #[error("field {field} of document {id} is not a timestamp")]
    BadTimestamp { id: String, field: &'static str },

    #[error("record does not serialize to an object")]
    NotAnObject,

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CodecError> for AppError {
    fn from(err: CodecError) -> Self {
        AppError::with_message(ErrorCode::InvalidFormat, err.to_string())
    }
}

/// Date fields stored as remote timestamps, per collection
pub fn timestamp_fields(collection: Collection) -> &'static [&'static str] {
    match collection {
        Collection::Sales => &["startDate", "nextDueDate", "createdAt", "updatedAt"],
        Collection::Payments => &["collectedAt", "createdAt"],
        Collection::Villages => &["createdAt"],
        Collection::Customers => &["createdAt", "updatedAt"],
        Collection::Products => &["createdAt"],
        Collection::Agents => &["createdAt", "updatedAt"],
    }
}

pub fn encode<T: Serialize>(
    collection: Collection,
    id: i64,
    record: &T,
) -> Result<RemoteDocument, CodecError> {
    let Value::Object(mut fields) = serde_json::to_value(record)? else {
        return Err(CodecError::NotAnObject);
    };
    fields.remove("id");
    fields.remove("syncStatus");

    for field in timestamp_fields(collection) {
        if let Some(value) = fields.get_mut(*field)
            && let Some(millis) = value.as_i64()
        {
            *value = RemoteTimestamp::from_millis(millis).to_value();
        }
    }

    Ok(RemoteDocument::new(id.to_string(), fields))
}

/// Decode a pulled document of `owner_id`'s partition
///
/// A missing `ownerId` field is filled in from the partition.
pub fn decode<T: DeserializeOwned>(
    collection: Collection,
    owner_id: &str,
    document: &RemoteDocument,
) -> Result<T, CodecError> {
    let id = document
        .local_id()
        .ok_or_else(|| CodecError::NonNumericId(document.id.clone()))?;

    let mut fields: Map<String, Value> = document.fields.clone();
    fields.insert("id".into(), Value::from(id));

    for field in timestamp_fields(collection) {
        let Some(value) = fields.get_mut(*field) else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        let ts = RemoteTimestamp::from_value(value).ok_or_else(|| CodecError::BadTimestamp {
            id: document.id.clone(),
            field: *field,
        })?;
        *value = Value::from(ts.to_millis());
    }

    fields
        .entry("ownerId")
        .or_insert_with(|| Value::from(owner_id));

    if collection.has_sync_status() {
        fields.insert(
            "syncStatus".into(),
            serde_json::to_value(SyncStatus::Synced)?,
        );
    }

    Ok(serde_json::from_value(Value::Object(fields))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::{Frequency, Payment, Sale, SaleStatus, Village};

    fn sample_sale() -> Sale {
        Sale {
            id: 7_000_123,
            owner_id: "owner-a".into(),
            village_id: 11,
            customer_id: 12,
            product_id: 13,
            down_payment: 500.0,
            emi_amount: 150.0,
            frequency: Frequency::Weekly,
            total_emis: 10,
            emis_collected: 3,
            start_date: 1_704_067_200_000,
            next_due_date: 1_705_881_600_000,
            status: SaleStatus::Active,
            assigned_agent_id: Some(99),
            created_at: 1_704_067_200_123,
            updated_at: 1_705_000_000_456,
            sync_status: SyncStatus::Pending,
        }
    }

    #[test]
    fn test_encode_sale_layout() {
        let doc = encode(Collection::Sales, 7_000_123, &sample_sale()).unwrap();
        assert_eq!(doc.id, "7000123");
        assert!(!doc.fields.contains_key("id"));
        assert!(!doc.fields.contains_key("syncStatus"));
        assert_eq!(doc.fields["totalEMIs"], 10);
        assert_eq!(doc.fields["createdAt"]["seconds"], 1_704_067_200);
        assert_eq!(doc.fields["createdAt"]["nanos"], 123_000_000);
        assert_eq!(doc.fields["nextDueDate"]["nanos"], 0);
    }

    #[test]
    fn test_decode_restores_record_and_marks_synced() {
        let sale = sample_sale();
        let doc = encode(Collection::Sales, sale.id, &sale).unwrap();
        let decoded: Sale = decode(Collection::Sales, "owner-a", &doc).unwrap();
        assert_eq!(decoded.sync_status, SyncStatus::Synced);
        assert_eq!(
            Sale {
                sync_status: SyncStatus::Pending,
                ..decoded
            },
            sale
        );
    }

    #[test]
    fn test_decode_fills_owner_and_accepts_null_dates() {
        let mut fields = Map::new();
        fields.insert("name".into(), Value::from("North"));
        fields.insert("createdAt".into(), RemoteTimestamp::from_millis(5_000).to_value());
        let village: Village =
            decode(Collection::Villages, "owner-b", &RemoteDocument::new("42", fields)).unwrap();
        assert_eq!(village.id, 42);
        assert_eq!(village.owner_id, "owner-b");
        assert_eq!(village.created_at, 5_000);
        assert!(village.agent_ids.is_empty());
    }

    #[test]
    fn test_decode_rejects_bad_documents() {
        let err = decode::<Payment>(Collection::Payments, "o", &RemoteDocument::new("abc", Map::new()))
            .unwrap_err();
        assert!(matches!(err, CodecError::NonNumericId(_)));

        let mut fields = Map::new();
        fields.insert("collectedAt".into(), Value::from("yesterday"));
        let err = decode::<Payment>(Collection::Payments, "o", &RemoteDocument::new("1", fields))
            .unwrap_err();
        assert!(matches!(err, CodecError::BadTimestamp { field: "collectedAt", .. }));

        // missing required fields
        let err = decode::<Payment>(Collection::Payments, "o", &RemoteDocument::new("1", Map::new()))
            .unwrap_err();
        assert!(matches!(err, CodecError::Json(_)));
    }
}
