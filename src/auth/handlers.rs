use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{AccountRequest, ChangePasswordRequest, PublicAccount, StatusResponse},
        error::AuthError,
        extractors::{
            expired_refresh_cookie, refresh_cookie, CurrentAccount, JsonBody, REFRESH_COOKIE,
        },
        services::{ClientInfo, SessionService},
    },
    state::AppState,
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn reject(status: StatusCode) -> Response {
    (status, Json(StatusResponse::error())).into_response()
}

fn client_info(headers: &HeaderMap) -> ClientInfo {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned()
    };
    let forwarded = header("x-forwarded-for");
    ClientInfo {
        ip_address: forwarded.split(',').next().unwrap_or_default().trim().to_owned(),
        user_agent: header("user-agent"),
    }
}

#[instrument(skip(sessions, payload))]
pub async fn create_account(
    State(sessions): State<SessionService>,
    JsonBody(payload): JsonBody<AccountRequest>,
) -> Result<Json<StatusResponse>, Response> {
    if payload.email.is_empty() || payload.password.is_empty() {
        warn!("create account missing fields");
        return Err(reject(StatusCode::BAD_REQUEST));
    }
    if !is_valid_email(&payload.email) {
        warn!("create account invalid email");
        return Err(reject(StatusCode::BAD_REQUEST));
    }

    sessions
        .create_account(&payload.email, &payload.password)
        .await
        .map_err(IntoResponse::into_response)?;
    Ok(Json(StatusResponse::ok()))
}

#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    JsonBody(payload): JsonBody<AccountRequest>,
) -> Result<(CookieJar, [(axum::http::HeaderName, String); 1], Json<StatusResponse>), Response> {
    if payload.email.is_empty() || payload.password.is_empty() {
        warn!("login missing fields");
        return Err(reject(StatusCode::BAD_REQUEST));
    }

    let tokens = state
        .sessions
        .login(&payload.email, &payload.password, client_info(&headers))
        .await
        .map_err(IntoResponse::into_response)?;

    let cookie = refresh_cookie(
        tokens.refresh_token,
        state.sessions.refresh_ttl(),
        &state.config.cookie,
    );
    Ok((
        jar.add(cookie),
        [(AUTHORIZATION, format!("Bearer {}", tokens.access_token))],
        Json(StatusResponse::ok()),
    ))
}

#[instrument(skip(state, jar))]
pub async fn logout(
    State(state): State<AppState>,
    CurrentAccount(account_id): CurrentAccount,
    jar: CookieJar,
) -> Result<(CookieJar, Json<StatusResponse>), Response> {
    let Some(raw) = jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned()) else {
        warn!("logout without refresh cookie");
        return Err(reject(StatusCode::BAD_REQUEST));
    };

    let session = state
        .sessions
        .validate_refresh_token(&raw)
        .await
        .map_err(IntoResponse::into_response)?;
    if session.account_id != account_id {
        warn!(session_id = session.id, "logout for a session of another account");
        return Err(AuthError::InvalidToken.into_response());
    }

    state
        .sessions
        .logout(&session)
        .await
        .map_err(IntoResponse::into_response)?;

    Ok((
        jar.add(expired_refresh_cookie(&state.config.cookie)),
        Json(StatusResponse::ok()),
    ))
}

#[instrument(skip(state, jar, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentAccount(account_id): CurrentAccount,
    jar: CookieJar,
    JsonBody(payload): JsonBody<ChangePasswordRequest>,
) -> Result<(CookieJar, Json<StatusResponse>), Response> {
    if payload.password.is_empty() {
        return Err(reject(StatusCode::BAD_REQUEST));
    }
    state
        .sessions
        .change_password(account_id, &payload.password)
        .await
        .map_err(IntoResponse::into_response)?;

    info!("password changed, sessions revoked");
    Ok((
        jar.add(expired_refresh_cookie(&state.config.cookie)),
        Json(StatusResponse::ok()),
    ))
}

#[instrument(skip(sessions))]
pub async fn me(
    State(sessions): State<SessionService>,
    CurrentAccount(account_id): CurrentAccount,
) -> Result<Json<PublicAccount>, AuthError> {
    let account = sessions
        .store()
        .find_account_by_id(account_id)
        .await?
        .ok_or(AuthError::Authentication)?;
    Ok(Json(account.into()))
}
