use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration, OffsetDateTime};
use tracing::debug;

use crate::auth::{claims::Claims, error::AuthError, store::AccountId};
use crate::config::JwtConfig;

/// The only algorithm accepted when verifying; whatever the token header
/// names is ignored.
const ALGORITHM: Algorithm = Algorithm::HS256;

/// Holds the signing secret and the access-token settings.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &[u8], issuer: &str, audience: &str, access_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            issuer: issuer.to_owned(),
            audience: audience.to_owned(),
            access_ttl,
        }
    }

    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self::new(
            cfg.secret.as_bytes(),
            &cfg.issuer,
            &cfg.audience,
            Duration::minutes(cfg.ttl_minutes),
        )
    }

    pub fn sign_access(&self, account_id: AccountId) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            account_id,
            iat: now.unix_timestamp(),
            exp: (now + self.access_ttl).unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };
        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding)?;
        debug!(account_id, "jwt signed");
        Ok(token)
    }

    /// Verifies signature, issuer and audience, then expiry with no leeway.
    ///
    /// Expiry is only reported for tokens whose signature and claims are
    /// otherwise sound, so an expired token never reads as invalid.
    pub fn verify(&self, token: &str) -> Result<AccountId, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_audience(std::slice::from_ref(&self.audience));

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            AuthError::InvalidToken
        })?;

        let claims = data.claims;
        if claims.exp <= OffsetDateTime::now_utc().unix_timestamp() {
            debug!(account_id = claims.account_id, "jwt expired");
            return Err(AuthError::ExpiredToken);
        }
        debug!(account_id = claims.account_id, "jwt verified");
        Ok(claims.account_id)
    }
}
