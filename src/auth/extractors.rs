use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::auth::{dto::StatusResponse, error::AuthError, store::AccountId};
use crate::config::CookieConfig;

pub const REFRESH_COOKIE: &str = "refreshToken";

/// Account resolved by the session middleware for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentAccount(pub AccountId);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentAccount
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentAccount>()
            .copied()
            .ok_or(AuthError::Authentication)
    }
}

/// JSON request body whose rejection is the same opaque 400 as every other
/// client error, instead of axum's plain-text detail.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => {
                warn!(error = %rejection, "malformed request body");
                Err((StatusCode::BAD_REQUEST, Json(StatusResponse::error())).into_response())
            }
        }
    }
}

/// Returns the token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn refresh_cookie(
    value: String,
    max_age: time::Duration,
    cfg: &CookieConfig,
) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, value))
        .http_only(true)
        .secure(cfg.secure)
        .same_site(SameSite::Strict)
        .path(cfg.path.clone())
        .max_age(max_age)
        .build()
}

pub fn expired_refresh_cookie(cfg: &CookieConfig) -> Cookie<'static> {
    refresh_cookie(String::new(), time::Duration::ZERO, cfg)
}
