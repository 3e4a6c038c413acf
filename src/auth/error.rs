use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use crate::auth::dto::StatusResponse;
use crate::auth::store::StoreError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("account already exists")]
    DuplicateAccount,
    /// Unknown email and wrong password collapse into this one variant.
    #[error("invalid credentials")]
    Authentication,
    #[error("token has expired")]
    ExpiredToken,
    #[error("invalid token")]
    InvalidToken,
    #[error("credential store: {0}")]
    Store(#[from] StoreError),
    #[error("hashing failed: {0}")]
    Hash(String),
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::DuplicateAccount => StatusCode::CONFLICT,
            AuthError::Authentication | AuthError::ExpiredToken | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Store(_) | AuthError::Hash(_) | AuthError::Signing(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "auth request failed");
        } else {
            warn!(error = %self, %status, "auth request rejected");
        }
        (status, Json(StatusResponse::error())).into_response()
    }
}
