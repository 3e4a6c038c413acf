use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::state::AppState;

mod claims;
mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod jwt;
#[cfg(test)]
pub(crate) mod memory;
pub mod middleware;
pub mod password;
mod refresh;
pub mod reissue;
pub mod repo;
pub mod services;
pub mod store;

pub(crate) use dto::StatusResponse;

use self::{middleware::require_session, services::SessionService};

pub fn router(sessions: SessionService) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/logout", post(handlers::logout))
        .route("/auth/changePassword", post(handlers::change_password))
        .route("/auth/me", get(handlers::me))
        .route_layer(from_fn_with_state(sessions, require_session));

    Router::new()
        .route("/auth/createAccount", post(handlers::create_account))
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}
