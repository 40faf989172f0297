use crate::state::AppState;
use axum::Router;

pub mod business;
pub mod claims;
pub mod codec;
mod dto;
pub mod handlers;
pub mod jwt;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Signup, login and token refresh; reachable without a token.
pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}

/// Profile routes; the caller mounts these behind the edge.
pub fn protected_router() -> Router<AppState> {
    handlers::me_routes()
}
