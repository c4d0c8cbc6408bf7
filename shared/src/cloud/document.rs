//! Remote document representation

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Remote native timestamp: `{"seconds": i64, "nanos": u32}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl RemoteTimestamp {
    /// Exact for every i64 millis value (negative included)
    pub fn from_millis(millis: i64) -> Self {
        Self {
            seconds: millis.div_euclid(1000),
            nanos: (millis.rem_euclid(1000) * 1_000_000) as u32,
        }
    }

    /// Sub-millisecond nanos are truncated
    pub fn to_millis(&self) -> i64 {
        self.seconds
            .saturating_mul(1000)
            .saturating_add(i64::from(self.nanos / 1_000_000))
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "seconds": self.seconds, "nanos": self.nanos })
    }

    /// Parse a timestamp field; plain integer millis are accepted too
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Object(_) => serde_json::from_value(value.clone()).ok(),
            Value::Number(n) => n.as_i64().map(Self::from_millis),
            _ => None,
        }
    }
}

/// One document of a remote collection
///
/// `id` is the stringified local numeric id. `fields` never contains `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteDocument {
    pub id: String,
    pub fields: Map<String, Value>,
}

impl RemoteDocument {
    pub fn new(id: impl Into<String>, fields: Map<String, Value>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Local numeric id, if the document id is one
    pub fn local_id(&self) -> Option<i64> {
        self.id.parse().ok()
    }
}
