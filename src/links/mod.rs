mod dto;
pub mod handlers;
mod repo;

use axum::{
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};

use crate::auth::{middleware::require_session, services::SessionService};
use crate::state::AppState;

pub fn router(sessions: SessionService) -> Router<AppState> {
    Router::new()
        .route("/createLink", post(handlers::create_link))
        .route_layer(from_fn_with_state(sessions, require_session))
        .route("/links/:short_url", get(handlers::resolve_link))
}
