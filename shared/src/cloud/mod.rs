//! Remote store wire types for edge-ledger ↔ ledger-cloud document sync

pub mod auth;
pub mod document;

pub use auth::*;
pub use document::*;

use serde::{Deserialize, Serialize};

/// The six per-owner remote collections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Sales,
    Payments,
    Villages,
    Customers,
    Products,
    Agents,
}

impl Collection {
    /// Pull order. Directory kinds come after the ledger kinds so a failed
    /// directory fetch never blocks sales/payments confirmation.
    pub const ALL: [Collection; 6] = [
        Self::Sales,
        Self::Payments,
        Self::Villages,
        Self::Customers,
        Self::Products,
        Self::Agents,
    ];

    /// Kinds carrying a `syncStatus` flag (pushed by `push_local`)
    pub const LEDGER: [Collection; 2] = [Self::Sales, Self::Payments];

    /// Kinds authored by the owner and published in full
    pub const DIRECTORY: [Collection; 4] =
        [Self::Villages, Self::Customers, Self::Products, Self::Agents];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Payments => "payments",
            Self::Villages => "villages",
            Self::Customers => "customers",
            Self::Products => "products",
            Self::Agents => "agents",
        }
    }

    pub fn has_sync_status(&self) -> bool {
        matches!(self, Self::Sales | Self::Payments)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Collection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown collection: {s}"))
    }
}
