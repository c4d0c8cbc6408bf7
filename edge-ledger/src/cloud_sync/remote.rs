//! Remote store abstraction

use async_trait::async_trait;
use shared::cloud::{Collection, RemoteDocument};
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Remote store unreachable: {0}")]
    Unavailable(String),

    #[error("Remote store rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Not authorised for this owner partition: {0}")]
    Unauthorized(String),

    #[error("Malformed remote response: {0}")]
    Malformed(String),
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        let code = match &err {
            RemoteError::Unavailable(_) => ErrorCode::RemoteUnavailable,
            RemoteError::Unauthorized(_) => ErrorCode::NotAuthenticated,
            RemoteError::Rejected { .. } | RemoteError::Malformed(_) => ErrorCode::SyncFailed,
        };
        AppError::with_message(code, err.to_string())
    }
}

/// Authoritative per-owner document store
///
/// Layout: `owners/{owner_id}/{collection}/{document id}`. Writes are
/// overwrites, so re-sending a document is harmless.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn set_document(
        &self,
        owner_id: &str,
        collection: Collection,
        document: &RemoteDocument,
    ) -> Result<(), RemoteError>;

    /// Full collection of one owner
    async fn list_documents(
        &self,
        owner_id: &str,
        collection: Collection,
    ) -> Result<Vec<RemoteDocument>, RemoteError>;

    /// Reachability probe
    async fn ping(&self) -> bool;
}
