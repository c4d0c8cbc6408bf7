//! Unified error codes for the ledger framework
//!
//! This module defines all error codes used across edge-ledger, ledger-cloud and clients.
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Tenant (owner partition) errors
//! - 4xxx: Directory errors (villages, customers, products, agents)
//! - 5xxx: Collection errors (sales, payments)
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Invalid format
    InvalidFormat = 6,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// Principal is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (phone/PIN or email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Operation requires an owner principal
    OwnerRequired = 2002,
    /// Operation requires an agent principal
    AgentRequired = 2003,

    // ==================== 3xxx: Tenant ====================
    /// Record belongs to a different owner partition
    OwnerMismatch = 3002,
    /// Email already registered
    EmailAlreadyRegistered = 3003,

    // ==================== 4xxx: Directory ====================
    /// Village not found
    VillageNotFound = 4001,
    /// Customer not found
    CustomerNotFound = 4002,
    /// Product not found
    ProductNotFound = 4003,
    /// Agent not found
    AgentNotFound = 4004,
    /// Agent phone already used by this owner
    AgentPhoneExists = 4005,

    // ==================== 5xxx: Collection ====================
    /// Sale not found
    SaleNotFound = 5001,
    /// Customer has no active sale
    NoActiveSale = 5002,
    /// Amount is not a positive finite number
    InvalidAmount = 5003,
    /// Due date arithmetic left the representable range
    ScheduleOverflow = 5004,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Network error
    NetworkError = 9003,
    /// Remote store rejected or failed a sync operation
    SyncFailed = 9101,
    /// Remote store is unreachable
    RemoteUnavailable = 9102,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "Not logged in",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::OwnerRequired => "Owner login is required",
            ErrorCode::AgentRequired => "Agent login is required",

            // Tenant
            ErrorCode::OwnerMismatch => "Record belongs to another owner",
            ErrorCode::EmailAlreadyRegistered => "Email is already registered",

            // Directory
            ErrorCode::VillageNotFound => "Village not found",
            ErrorCode::CustomerNotFound => "Customer not found",
            ErrorCode::ProductNotFound => "Product not found",
            ErrorCode::AgentNotFound => "Agent not found",
            ErrorCode::AgentPhoneExists => "An agent with this phone already exists",

            // Collection
            ErrorCode::SaleNotFound => "Sale not found",
            ErrorCode::NoActiveSale => "No active EMI for this customer",
            ErrorCode::InvalidAmount => "Invalid amount",
            ErrorCode::ScheduleOverflow => "Due date is out of range",

            // System
            ErrorCode::InternalError => "Internal error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::NetworkError => "Network error",
            ErrorCode::SyncFailed => "Sync failed",
            ErrorCode::RemoteUnavailable => "Remote store is unavailable",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            6 => Ok(ErrorCode::InvalidFormat),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2002 => Ok(ErrorCode::OwnerRequired),
            2003 => Ok(ErrorCode::AgentRequired),

            // Tenant
            3002 => Ok(ErrorCode::OwnerMismatch),
            3003 => Ok(ErrorCode::EmailAlreadyRegistered),

            // Directory
            4001 => Ok(ErrorCode::VillageNotFound),
            4002 => Ok(ErrorCode::CustomerNotFound),
            4003 => Ok(ErrorCode::ProductNotFound),
            4004 => Ok(ErrorCode::AgentNotFound),
            4005 => Ok(ErrorCode::AgentPhoneExists),

            // Collection
            5001 => Ok(ErrorCode::SaleNotFound),
            5002 => Ok(ErrorCode::NoActiveSale),
            5003 => Ok(ErrorCode::InvalidAmount),
            5004 => Ok(ErrorCode::ScheduleOverflow),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9003 => Ok(ErrorCode::NetworkError),
            9101 => Ok(ErrorCode::SyncFailed),
            9102 => Ok(ErrorCode::RemoteUnavailable),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::NotFound.code(), 3);
        assert_eq!(ErrorCode::InvalidCredentials.code(), 1002);
        assert_eq!(ErrorCode::OwnerMismatch.code(), 3002);
        assert_eq!(ErrorCode::CustomerNotFound.code(), 4002);
        assert_eq!(ErrorCode::NoActiveSale.code(), 5002);
        assert_eq!(ErrorCode::InvalidAmount.code(), 5003);
        assert_eq!(ErrorCode::SyncFailed.code(), 9101);
    }

    #[test]
    fn test_is_success() {
        assert!(ErrorCode::Success.is_success());
        assert!(!ErrorCode::NoActiveSale.is_success());
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(4005), Ok(ErrorCode::AgentPhoneExists));
        assert_eq!(ErrorCode::try_from(5002), Ok(ErrorCode::NoActiveSale));
        assert_eq!(ErrorCode::try_from(9102), Ok(ErrorCode::RemoteUnavailable));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(9999), Err(InvalidErrorCode(9999)));
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        // retired codes are not reissued
        assert_eq!(ErrorCode::try_from(1005), Err(InvalidErrorCode(1005)));
        assert_eq!(ErrorCode::try_from(2001), Err(InvalidErrorCode(2001)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::NoActiveSale).unwrap();
        assert_eq!(json, "5002");
    }

    #[test]
    fn test_deserialize_invalid() {
        let result: Result<ErrorCode, _> = serde_json::from_str("12345");
        assert!(result.is_err());
    }

    #[test]
    fn test_roundtrip() {
        let codes = [
            ErrorCode::ValidationFailed,
            ErrorCode::OwnerRequired,
            ErrorCode::EmailAlreadyRegistered,
            ErrorCode::VillageNotFound,
            ErrorCode::ScheduleOverflow,
        ];
        for code in codes {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::SaleNotFound.to_string(), "5001");
    }
}
