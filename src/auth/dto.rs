use serde::{Deserialize, Serialize};

use crate::auth::store::{Account, AccountId};

/// Request body for account creation and login.
#[derive(Debug, Deserialize)]
pub struct AccountRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for a password change.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub password: String,
}

/// Generic body returned by the auth endpoints. Failures never carry detail.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }

    pub fn error() -> Self {
        Self { status: "error" }
    }
}

/// Public part of the account returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicAccount {
    pub id: AccountId,
    pub email: String,
    pub verified: bool,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            email: a.email,
            verified: a.verified,
        }
    }
}
