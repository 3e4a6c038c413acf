use serde::{Deserialize, Serialize};

use crate::auth::store::AccountId;

/// JWT payload of an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub account_id: AccountId, // account the token was issued to
    pub exp: i64,              // expires at (unix timestamp)
    pub iat: i64,              // issued at (unix timestamp)
    pub iss: String,           // issuer
    pub aud: String,           // audience
}
