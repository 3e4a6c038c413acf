use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use tracing::error;

use crate::auth::{
    error::AuthError,
    extractors::{bearer_token, CurrentAccount, REFRESH_COOKIE},
    reissue::authenticate,
    services::SessionService,
};

/// Resolves the caller before the protected handler runs.
///
/// The account id is stored in the request extensions as [`CurrentAccount`].
/// When the access token had to be reissued the new one is returned in the
/// `Authorization` response header.
pub async fn require_session(
    State(sessions): State<SessionService>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let bearer = bearer_token(request.headers()).map(str::to_owned);
    let refresh = jar.get(REFRESH_COOKIE).map(|c| c.value().to_owned());

    let auth = authenticate(&sessions, bearer.as_deref(), refresh.as_deref()).await?;
    request
        .extensions_mut()
        .insert(CurrentAccount(auth.account_id()));

    let mut response = next.run(request).await;
    if let Some(token) = auth.reissued_token() {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => {
                response.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => error!(error = %e, "reissued token is not a valid header value"),
        }
    }
    Ok(response)
}
