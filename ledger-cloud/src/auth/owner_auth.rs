//! Owner JWT authentication for the document API
//!
//! The token subject is the owner uid. A request may only touch the
//! partition named by its own subject.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};

use crate::state::AppState;

/// JWT claims for owner authentication
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerClaims {
    /// Owner uid (partition key)
    pub sub: String,
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated owner extracted from the bearer token
#[derive(Debug, Clone)]
pub struct OwnerIdentity {
    pub owner_id: String,
    pub email: String,
}

impl OwnerIdentity {
    /// Reject access to any partition other than the caller's own
    pub fn check_partition(&self, owner_id: &str) -> Result<(), AppError> {
        if self.owner_id != owner_id {
            tracing::warn!(
                caller = %self.owner_id,
                requested = %owner_id,
                "Cross-partition access denied"
            );
            return Err(AppError::new(ErrorCode::OwnerMismatch));
        }
        Ok(())
    }
}

// 设备可能长时间离线，token 有效期按天计
const JWT_EXPIRY_DAYS: i64 = 30;

/// Create a JWT token for an owner
pub fn create_token(
    owner_id: &str,
    email: &str,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = OwnerClaims {
        sub: owner_id.to_string(),
        email: email.to_string(),
        exp: (now + chrono::Duration::days(JWT_EXPIRY_DAYS)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

fn decode_token(token: &str, secret: &str) -> Result<OwnerIdentity, AppError> {
    let token_data = jsonwebtoken::decode::<OwnerClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                AppError::new(ErrorCode::TokenExpired)
            }
            _ => AppError::new(ErrorCode::TokenInvalid),
        }
    })?;

    Ok(OwnerIdentity {
        owner_id: token_data.claims.sub,
        email: token_data.claims.email,
    })
}

/// Middleware that extracts and verifies the owner JWT from the Authorization header
pub async fn owner_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Missing Authorization header")
                .into_response()
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::with_message(ErrorCode::TokenInvalid, "Invalid Authorization format")
            .into_response()
    })?;

    let identity = decode_token(token, &state.jwt_secret).map_err(IntoResponse::into_response)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
