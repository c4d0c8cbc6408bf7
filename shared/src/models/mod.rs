//! Data models
//!
//! Shared between edge-ledger and ledger-cloud (via the document API).
//! DB row types use `#[cfg_attr(feature = "db", derive(sqlx::FromRow))]`.
//! Local IDs are `i64` (SQLite INTEGER PRIMARY KEY); `owner_id` is the
//! owner's external uid.

pub mod agent;
pub mod customer;
pub mod owner;
pub mod payment;
pub mod product;
pub mod receipt;
pub mod report;
pub mod sale;
pub mod sync;
pub mod village;

// Re-exports
pub use agent::*;
pub use customer::*;
pub use owner::*;
pub use payment::*;
pub use product::*;
pub use receipt::*;
pub use report::*;
pub use sale::*;
pub use sync::*;
pub use village::*;
