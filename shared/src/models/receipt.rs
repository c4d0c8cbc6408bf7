//! Receipt contract surface returned by a successful collection

use serde::{Deserialize, Serialize};

use super::{Agent, Customer, Payment, Sale};

/// The four records a receipt is rendered from
///
/// `sale` is the post-advance state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub payment: Payment,
    pub sale: Sale,
    pub customer: Customer,
    pub agent: ReceiptAgent,
}

/// Collector as printed on a receipt (no credential material)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptAgent {
    pub id: i64,
    pub name: String,
    pub phone: String,
}

impl From<&Agent> for ReceiptAgent {
    fn from(agent: &Agent) -> Self {
        Self {
            id: agent.id,
            name: agent.name.clone(),
            phone: agent.phone.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_agent_drops_pin_hash() {
        let agent = Agent {
            id: 7,
            owner_id: "owner".into(),
            phone: "9000000001".into(),
            pin_hash: "$argon2id$secret".into(),
            name: "Suresh".into(),
            assigned_villages: vec![1],
            created_at: 0,
            updated_at: 0,
        };
        let json = serde_json::to_value(ReceiptAgent::from(&agent)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "id": 7, "name": "Suresh", "phone": "9000000001" })
        );
    }
}
