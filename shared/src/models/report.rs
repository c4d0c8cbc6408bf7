//! Read-side report types

use serde::{Deserialize, Serialize};

use super::{Agent, Customer, Payment, Product, Sale, Village};

/// All six collections of one owner partition (export accessor)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OwnerSnapshot {
    pub sales: Vec<Sale>,
    pub payments: Vec<Payment>,
    pub villages: Vec<Village>,
    pub customers: Vec<Customer>,
    pub products: Vec<Product>,
    pub agents: Vec<Agent>,
}

impl OwnerSnapshot {
    pub fn record_count(&self) -> usize {
        self.sales.len()
            + self.payments.len()
            + self.villages.len()
            + self.customers.len()
            + self.products.len()
            + self.agents.len()
    }
}

/// Owner dashboard figures
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerStats {
    pub total_collected: f64,
    pub active_sales: i64,
    pub customers: i64,
    pub pending_sync: i64,
}

/// Due amount of one village
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VillageDue {
    pub village_id: i64,
    pub village_name: String,
    pub due_amount: f64,
    pub due_sales: i64,
}
