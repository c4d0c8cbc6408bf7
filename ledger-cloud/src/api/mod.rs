//! API routes for ledger-cloud

pub mod auth;
pub mod documents;
pub mod health;

use crate::auth::owner_auth_middleware;
use crate::state::AppState;
use axum::routing::{get, post, put};
use axum::{Router, middleware};
use shared::error::AppError;
use tower_http::trace::TraceLayer;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Owner document API (bearer JWT, subject must match the path owner)
    let documents = Router::new()
        .route(
            "/api/owners/{owner_id}/{collection}",
            get(documents::list_documents),
        )
        .route(
            "/api/owners/{owner_id}/{collection}/{doc_id}",
            put(documents::put_document),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            owner_auth_middleware,
        ));

    // Owner accounts (no auth)
    let accounts = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(accounts)
        .merge(documents)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
