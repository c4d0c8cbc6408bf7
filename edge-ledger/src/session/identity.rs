//! External identity provider (owner login)

use async_trait::async_trait;
use reqwest::Client;
use shared::cloud::{AuthResponse, LoginRequest};
use shared::error::{ApiResponse, AppError, AppResult, ErrorCode};
use std::time::Duration;

/// Identity returned by a successful owner sign-in
///
/// `uid` becomes the owner's partition key. `token` authorises remote
/// store requests.
#[derive(Debug, Clone, PartialEq)]
pub struct ExternalIdentity {
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub token: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<ExternalIdentity>;
}

/// Identity provider backed by the ledger-cloud account endpoints
pub struct HttpIdentityProvider {
    client: Client,
    base_url: String,
}

impl HttpIdentityProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<ExternalIdentity> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await
            .map_err(|e| AppError::with_message(ErrorCode::NetworkError, format!("Sign-in request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Error bodies are ApiResponse; keep the server's code when present
            let body: Option<ApiResponse<()>> = response.json().await.ok();
            let code = body
                .as_ref()
                .and_then(|b| b.code)
                .and_then(|c| ErrorCode::try_from(c).ok())
                .unwrap_or(if status.is_client_error() {
                    ErrorCode::InvalidCredentials
                } else {
                    ErrorCode::RemoteUnavailable
                });
            return Err(AppError::new(code).with_detail("status", status.as_u16()));
        }

        let auth: AuthResponse = response
            .json()
            .await
            .map_err(|e| AppError::internal(format!("Failed to parse sign-in response: {e}")))?;

        Ok(ExternalIdentity {
            uid: auth.uid,
            email: auth.email,
            name: auth.name,
            token: Some(auth.token),
        })
    }
}
