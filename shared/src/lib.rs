//! Shared types for the EMI ledger
//!
//! Data model, error types, remote document wire types and time/id
//! utilities used by edge-ledger and ledger-cloud.

pub mod cloud;
pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::Json;
pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use http;
pub use serde::{Deserialize, Serialize};
