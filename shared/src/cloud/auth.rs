//! Owner account API types (ledger-cloud identity endpoints)

use serde::{Deserialize, Serialize};

/// POST /api/auth/register
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

/// POST /api/auth/login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Register/login response
///
/// `uid` is the owner's external identity and partition key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub token: String,
}
