//! Sale Model (one installment plan)

use serde::{Deserialize, Serialize};

use super::sync::SyncStatus;

/// Installment period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// Sale lifecycle status
///
/// `Completed` is terminal. `Defaulted` is never set automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::Type))]
#[cfg_attr(feature = "db", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    Active,
    Completed,
    Defaulted,
}

impl SaleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Defaulted => "defaulted",
        }
    }
}

/// Sale entity
///
/// Invariants:
/// - `0 <= emis_collected <= total_emis`
/// - `status == Completed` iff `emis_collected >= total_emis`
/// - `next_due_date == start_date + emis_collected periods of frequency`
///
/// Dates are Unix millis (UTC).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: i64,
    pub owner_id: String,
    pub village_id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub down_payment: f64,
    pub emi_amount: f64,
    pub frequency: Frequency,
    #[serde(rename = "totalEMIs")]
    pub total_emis: i64,
    pub emis_collected: i64,
    pub start_date: i64,
    pub next_due_date: i64,
    pub status: SaleStatus,
    pub assigned_agent_id: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub sync_status: SyncStatus,
}

impl Sale {
    pub fn is_active(&self) -> bool {
        self.status == SaleStatus::Active
    }

    pub fn remaining_emis(&self) -> i64 {
        (self.total_emis - self.emis_collected).max(0)
    }
}

/// Customer reference for a new sale: existing record or inline creation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SaleCustomer {
    Existing {
        #[serde(rename = "customerId")]
        customer_id: i64,
    },
    New {
        name: String,
        phone: Option<String>,
        address: Option<String>,
    },
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleCreate {
    pub village_id: i64,
    pub customer: SaleCustomer,
    pub product_id: i64,
    pub down_payment: f64,
    pub emi_amount: f64,
    pub frequency: Frequency,
    #[serde(rename = "totalEMIs")]
    pub total_emis: i64,
    pub start_date: i64,
    pub assigned_agent_id: Option<i64>,
}
