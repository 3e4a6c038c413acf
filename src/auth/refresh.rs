//! Raw refresh tokens: `"<account_id>:<secret>"`.
//!
//! The account prefix only scopes the session lookup; the secret part is what
//! is checked against the stored hash (the whole string is hashed).

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};

use crate::auth::store::AccountId;

const SECRET_LEN: usize = 43;

/// Generates a fresh raw refresh token for `account_id`.
pub fn generate(account_id: AccountId) -> String {
    let secret: String = OsRng
        .sample_iter(&Alphanumeric)
        .take(SECRET_LEN)
        .map(char::from)
        .collect();
    format!("{account_id}:{secret}")
}

/// Extracts the account prefix, or `None` when the token has the wrong shape.
pub fn parse_account_id(raw: &str) -> Option<AccountId> {
    let (prefix, secret) = raw.split_once(':')?;
    if secret.is_empty() || secret.contains(':') {
        return None;
    }
    prefix.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_token_carries_account_prefix() {
        let token = generate(17);
        assert!(token.starts_with("17:"));
        assert_eq!(token.len(), "17:".len() + SECRET_LEN);
        assert_eq!(parse_account_id(&token), Some(17));
    }

    #[test]
    fn generated_tokens_differ() {
        assert_ne!(generate(1), generate(1));
    }

    #[test]
    fn malformed_tokens_do_not_parse() {
        for raw in ["", "abc", "1:", ":abc", "x:abc", "1:a:b", "1.5:abc"] {
            assert_eq!(parse_account_id(raw), None, "{raw:?}");
        }
    }
}
