use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tokio::task::spawn_blocking;
use tracing::{info, instrument, warn};

use crate::auth::{
    error::AuthError,
    jwt::JwtKeys,
    password::Hasher,
    refresh,
    store::{Account, AccountId, CredentialStore, NewAccount, NewSession, Session, StoreError},
};
use crate::config::JwtConfig;

/// Optional client metadata recorded with a session.
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    pub ip_address: String,
    pub user_agent: String,
}

/// Credentials handed out by a successful login. The raw refresh token
/// exists only here; the store keeps its hash.
pub struct LoginTokens {
    pub account_id: AccountId,
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and validates sessions. Built once at start-up and shared by the
/// request layer.
#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn CredentialStore>,
    keys: JwtKeys,
    hasher: Hasher,
    refresh_ttl: Duration,
    /// Verified against on unknown-email logins so they cost as much as a
    /// wrong password.
    dummy_hash: Arc<str>,
}

impl SessionService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        keys: JwtKeys,
        hasher: Hasher,
        refresh_ttl: Duration,
    ) -> Result<Self, AuthError> {
        let dummy_hash = hasher.hash("cascade-dummy-password")?.into();
        Ok(Self {
            store,
            keys,
            hasher,
            refresh_ttl,
            dummy_hash,
        })
    }

    pub fn from_config(
        store: Arc<dyn CredentialStore>,
        cfg: &JwtConfig,
    ) -> Result<Self, AuthError> {
        Self::new(
            store,
            JwtKeys::from_config(cfg),
            Hasher::default(),
            Duration::minutes(cfg.refresh_ttl_minutes),
        )
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    async fn hash(&self, plain: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let plain = plain.to_owned();
        spawn_blocking(move || hasher.hash(&plain))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))?
    }

    async fn verify(&self, hash: String, plain: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let plain = plain.to_owned();
        spawn_blocking(move || hasher.verify(&hash, &plain))
            .await
            .map_err(|e| AuthError::Hash(e.to_string()))
    }

    #[instrument(skip(self, password))]
    pub async fn create_account(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        if self.store.find_account_by_email(email).await?.is_some() {
            warn!("email already registered");
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = self.hash(password).await?;
        let account = self
            .store
            .insert_account(NewAccount {
                email: email.to_owned(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent signup
                StoreError::Conflict => AuthError::DuplicateAccount,
                other => other.into(),
            })?;

        info!(account_id = account.id, "account created");
        Ok(account)
    }

    #[instrument(skip(self, password, client))]
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        client: ClientInfo,
    ) -> Result<LoginTokens, AuthError> {
        let account = match self.store.find_account_by_email(email).await? {
            Some(a) => a,
            None => {
                self.verify(self.dummy_hash.to_string(), password).await?;
                warn!("login unknown email");
                return Err(AuthError::Authentication);
            }
        };

        if !self.verify(account.password_hash.clone(), password).await? {
            warn!(account_id = account.id, "login invalid password");
            return Err(AuthError::Authentication);
        }

        let access_token = self.generate_access_token(account.id)?;
        let refresh_token = refresh::generate(account.id);
        let refresh_token_hash = self.hash(&refresh_token).await?;

        let session = self
            .store
            .insert_session(NewSession {
                account_id: account.id,
                refresh_token_hash,
                ip_address: client.ip_address,
                user_agent: client.user_agent,
                expires_at: OffsetDateTime::now_utc() + self.refresh_ttl,
            })
            .await?;

        info!(account_id = account.id, session_id = session.id, "account logged in");
        Ok(LoginTokens {
            account_id: account.id,
            access_token,
            refresh_token,
        })
    }

    pub fn generate_access_token(&self, account_id: AccountId) -> Result<String, AuthError> {
        self.keys.sign_access(account_id)
    }

    pub fn validate_access_token(&self, token: &str) -> Result<AccountId, AuthError> {
        self.keys.verify(token)
    }

    /// Finds the live session whose stored hash matches `raw`.
    ///
    /// Only the unexpired sessions of the account named by the token prefix
    /// are considered.
    #[instrument(skip_all)]
    pub async fn validate_refresh_token(&self, raw: &str) -> Result<Session, AuthError> {
        let Some(account_id) = refresh::parse_account_id(raw) else {
            warn!("malformed refresh token");
            return Err(AuthError::InvalidToken);
        };

        let now = OffsetDateTime::now_utc();
        let candidates: Vec<Session> = self
            .store
            .find_active_sessions_for_account(account_id, now)
            .await?
            .into_iter()
            .filter(|s| s.is_active(now))
            .collect();

        let hasher = self.hasher.clone();
        let raw = raw.to_owned();
        let matched = spawn_blocking(move || {
            candidates
                .into_iter()
                .find(|s| hasher.verify(&s.refresh_token_hash, &raw))
        })
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?;

        match matched {
            Some(session) => Ok(session),
            None => {
                warn!(account_id, "no session matches refresh token");
                Err(AuthError::InvalidToken)
            }
        }
    }

    #[instrument(skip_all, fields(session_id = session.id))]
    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        self.store.delete_session(session.id).await?;
        info!(account_id = session.account_id, "session closed");
        Ok(())
    }

    /// Replaces the password hash and revokes every session of the account.
    #[instrument(skip(self, new_password))]
    pub async fn change_password(
        &self,
        account_id: AccountId,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let password_hash = self.hash(new_password).await?;
        self.store
            .update_account_password(account_id, &password_hash)
            .await?;
        let revoked = self.store.delete_sessions_for_account(account_id).await?;
        info!(account_id, revoked, "password changed");
        Ok(())
    }
}
