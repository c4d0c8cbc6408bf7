//! Owner account endpoints: register, login
//!
//! These back the edge-ledger owner login. The returned `uid` is the owner
//! partition key and `token` authorises the document API.

use axum::{Json, extract::State};
use shared::cloud::{AuthResponse, LoginRequest, RegisterRequest};
use shared::error::{AppError, ErrorCode};

use crate::auth::create_token;
use crate::db::owners::{self, OwnerAccount};
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

use super::ApiResult;

const MIN_PASSWORD_LEN: usize = 8;

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::validation("Invalid email").with_detail("field", "email"));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ))
        .with_detail("field", "password"));
    }

    if owners::find_by_email(&state.pool, &email).await.map_err(db_error)?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered));
    }

    let hashed_password = hash_password(&req.password).map_err(|e| {
        tracing::error!("Password hashing failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    let account = OwnerAccount {
        uid: uuid::Uuid::new_v4().simple().to_string(),
        email,
        hashed_password,
        name: req.name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()),
        created_at: shared::util::now_millis(),
    };
    owners::create(&state.pool, &account).await.map_err(|e| {
        // lost a race with a concurrent registration
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            AppError::new(ErrorCode::EmailAlreadyRegistered)
        } else {
            db_error(e)
        }
    })?;

    tracing::info!(owner_id = %account.uid, "Owner registered");
    issue(&state, account)
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<AuthResponse> {
    let email = req.email.trim().to_lowercase();
    let account = owners::find_by_email(&state.pool, &email)
        .await
        .map_err(db_error)?
        .ok_or_else(AppError::invalid_credentials)?;

    if !verify_password(&req.password, &account.hashed_password) {
        tracing::warn!(owner_id = %account.uid, "Owner login failed");
        return Err(AppError::invalid_credentials());
    }

    tracing::info!(owner_id = %account.uid, "Owner logged in");
    issue(&state, account)
}

fn issue(state: &AppState, account: OwnerAccount) -> ApiResult<AuthResponse> {
    let token = create_token(&account.uid, &account.email, &state.jwt_secret).map_err(|e| {
        tracing::error!("JWT creation failed: {e}");
        AppError::new(ErrorCode::InternalError)
    })?;

    Ok(Json(AuthResponse {
        uid: account.uid,
        email: account.email,
        name: account.name,
        token,
    }))
}

fn db_error(e: sqlx::Error) -> AppError {
    tracing::error!("DB error in auth endpoint: {e}");
    AppError::new(ErrorCode::InternalError)
}
