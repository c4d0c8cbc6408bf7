//! Owner bearer-token authentication

pub mod owner_auth;

pub use owner_auth::{OwnerIdentity, create_token, owner_auth_middleware};
