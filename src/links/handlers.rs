use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::{
    dto::{LinkRequest, LinkResponse},
    repo,
};
use crate::{
    auth::{
        extractors::{CurrentAccount, JsonBody},
        StatusResponse,
    },
    state::AppState,
};

fn is_valid_short_url(short_url: &str) -> bool {
    lazy_static! {
        static ref SHORT_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,64}$").unwrap();
    }
    SHORT_RE.is_match(short_url)
}

fn is_valid_target(url: &str) -> bool {
    lazy_static! {
        static ref URL_RE: Regex = Regex::new(r"^https?://[^\s/$.?#][^\s]*$").unwrap();
    }
    URL_RE.is_match(url)
}

fn fail(status: StatusCode) -> Response {
    (status, Json(StatusResponse::error())).into_response()
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[instrument(skip(state, payload))]
pub async fn create_link(
    State(state): State<AppState>,
    CurrentAccount(account_id): CurrentAccount,
    JsonBody(payload): JsonBody<LinkRequest>,
) -> Result<Json<LinkResponse>, Response> {
    if payload.url.is_empty() || payload.short_url.is_empty() {
        warn!("create link missing fields");
        return Err(fail(StatusCode::BAD_REQUEST));
    }
    if !is_valid_target(&payload.url) || !is_valid_short_url(&payload.short_url) {
        warn!(short_url = %payload.short_url, "create link invalid fields");
        return Err(fail(StatusCode::BAD_REQUEST));
    }

    let link = match repo::create(&state.db, &payload.url, &payload.short_url, account_id).await {
        Ok(link) => link,
        Err(e) if is_unique_violation(&e) => {
            warn!(short_url = %payload.short_url, "short url already exists");
            return Err(fail(StatusCode::CONFLICT));
        }
        Err(e) => {
            error!(error = %e, "create link failed");
            return Err(fail(StatusCode::INTERNAL_SERVER_ERROR));
        }
    };

    info!(link_id = link.id, short_url = %link.short_url, "link created");
    Ok(Json(LinkResponse {
        status: "ok",
        url: link.url,
        short_url: link.short_url,
    }))
}

#[instrument(skip(state))]
pub async fn resolve_link(
    State(state): State<AppState>,
    Path(short_url): Path<String>,
) -> Response {
    match repo::resolve(&state.db, &short_url).await {
        Ok(Some(url)) => Redirect::temporary(&url).into_response(),
        Ok(None) => fail(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(error = %e, "resolve link failed");
            fail(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
