//! Per-request decision about who is asking.
//!
//! A valid bearer token is accepted as is. A missing, expired or invalid one
//! falls back to the refresh cookie, which re-mints an access token when it
//! still matches a live session. Anything else rejects the request.

use tracing::debug;

use crate::auth::{error::AuthError, services::SessionService, store::AccountId};

/// Outcome of a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authentication {
    /// The presented access token was valid.
    Verified { account_id: AccountId },
    /// A new access token was minted from the refresh cookie; it must be
    /// handed back to the caller.
    Reissued {
        account_id: AccountId,
        access_token: String,
    },
}

impl Authentication {
    pub fn account_id(&self) -> AccountId {
        match self {
            Authentication::Verified { account_id } | Authentication::Reissued { account_id, .. } => {
                *account_id
            }
        }
    }

    pub fn reissued_token(&self) -> Option<&str> {
        match self {
            Authentication::Verified { .. } => None,
            Authentication::Reissued { access_token, .. } => Some(access_token),
        }
    }
}

pub async fn authenticate(
    sessions: &SessionService,
    bearer: Option<&str>,
    refresh_cookie: Option<&str>,
) -> Result<Authentication, AuthError> {
    if let Some(token) = bearer {
        match sessions.validate_access_token(token) {
            Ok(account_id) => return Ok(Authentication::Verified { account_id }),
            Err(e) => debug!(error = %e, "access token not accepted, trying refresh cookie"),
        }
    }
    reissue(sessions, refresh_cookie).await
}

async fn reissue(
    sessions: &SessionService,
    refresh_cookie: Option<&str>,
) -> Result<Authentication, AuthError> {
    let Some(raw) = refresh_cookie else {
        debug!("no refresh cookie");
        return Err(AuthError::Authentication);
    };
    let session = sessions.validate_refresh_token(raw).await?;
    let access_token = sessions.generate_access_token(session.account_id)?;
    debug!(
        account_id = session.account_id,
        session_id = session.id,
        "access token reissued"
    );
    Ok(Authentication::Reissued {
        account_id: session.account_id,
        access_token,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::services::{testing, ClientInfo, LoginTokens};
    use time::Duration;

    async fn logged_in() -> (SessionService, LoginTokens) {
        let (service, _) = testing::service();
        service.create_account("a@x.com", "correct-horse").await.unwrap();
        let tokens = service
            .login("a@x.com", "correct-horse", ClientInfo::default())
            .await
            .expect("login");
        (service, tokens)
    }

    #[tokio::test]
    async fn valid_bearer_is_accepted_without_cookie() {
        let (service, tokens) = logged_in().await;
        let auth = authenticate(&service, Some(&tokens.access_token), None)
            .await
            .unwrap();
        assert_eq!(
            auth,
            Authentication::Verified {
                account_id: tokens.account_id
            }
        );
        assert!(auth.reissued_token().is_none());
    }

    #[tokio::test]
    async fn expired_bearer_with_valid_cookie_is_reissued() {
        let (service, tokens) = logged_in().await;
        let expired = testing::keys(Duration::minutes(-1))
            .sign_access(tokens.account_id)
            .unwrap();
        assert!(matches!(
            service.validate_access_token(&expired),
            Err(AuthError::ExpiredToken)
        ));

        let auth = authenticate(&service, Some(&expired), Some(&tokens.refresh_token))
            .await
            .unwrap();
        assert_eq!(auth.account_id(), tokens.account_id);
        let fresh = auth.reissued_token().expect("new token");
        assert_eq!(
            service.validate_access_token(fresh).unwrap(),
            tokens.account_id
        );
    }

    #[tokio::test]
    async fn missing_bearer_uses_cookie() {
        let (service, tokens) = logged_in().await;
        let auth = authenticate(&service, None, Some(&tokens.refresh_token))
            .await
            .unwrap();
        assert!(matches!(auth, Authentication::Reissued { .. }));
    }

    #[tokio::test]
    async fn invalid_bearer_uses_cookie() {
        let (service, tokens) = logged_in().await;
        let auth = authenticate(&service, Some("garbage"), Some(&tokens.refresh_token))
            .await
            .unwrap();
        assert_eq!(auth.account_id(), tokens.account_id);
    }

    #[tokio::test]
    async fn no_credentials_are_rejected() {
        let (service, _) = logged_in().await;
        assert!(matches!(
            authenticate(&service, None, None).await,
            Err(AuthError::Authentication)
        ));
    }

    #[tokio::test]
    async fn invalid_bearer_without_cookie_is_rejected() {
        let (service, _) = logged_in().await;
        let err = authenticate(&service, Some("garbage"), None).await.unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn bad_cookie_is_rejected() {
        let (service, tokens) = logged_in().await;
        let forged = format!("{}:nope", tokens.account_id);
        assert!(matches!(
            authenticate(&service, None, Some(&forged)).await,
            Err(AuthError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn cookie_stops_working_after_logout() {
        let (service, tokens) = logged_in().await;
        let session = service
            .validate_refresh_token(&tokens.refresh_token)
            .await
            .unwrap();
        service.logout(&session).await.unwrap();
        assert!(authenticate(&service, None, Some(&tokens.refresh_token))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn concurrent_reissues_both_succeed() {
        let (service, tokens) = logged_in().await;
        let (a, b) = tokio::join!(
            authenticate(&service, None, Some(&tokens.refresh_token)),
            authenticate(&service, None, Some(&tokens.refresh_token)),
        );
        assert_eq!(a.unwrap().account_id(), tokens.account_id);
        assert_eq!(b.unwrap().account_id(), tokens.account_id);
    }
}
