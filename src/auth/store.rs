use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use time::OffsetDateTime;

pub type AccountId = i64;
pub type SessionId = i64;

/// Account record as persisted by the credential store.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, never exposed
    pub verified: bool,
    pub created_at: OffsetDateTime,
}

/// Fields required to insert a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub email: String,
    pub password_hash: String,
}

/// Server-side record of an outstanding refresh token.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: SessionId,
    pub account_id: AccountId,
    pub refresh_token_hash: String,
    pub ip_address: String,
    pub user_agent: String,
    pub expires_at: OffsetDateTime,
    pub created_at: OffsetDateTime,
}

impl Session {
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub account_id: AccountId,
    pub refresh_token_hash: String,
    pub ip_address: String,
    pub user_agent: String,
    pub expires_at: OffsetDateTime,
}

#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence contract for accounts and sessions.
///
/// Each method is atomic on its own; callers never rely on atomicity across
/// several calls. `insert_account` must reject duplicate emails with
/// [`StoreError::Conflict`].
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn update_account_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), StoreError>;

    async fn insert_session(&self, session: NewSession) -> Result<Session, StoreError>;

    /// Sessions of `account_id` whose `expires_at` is strictly after `now`.
    async fn find_active_sessions_for_account(
        &self,
        account_id: AccountId,
        now: OffsetDateTime,
    ) -> Result<Vec<Session>, StoreError>;

    /// Deleting an absent session is not an error.
    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError>;

    async fn delete_sessions_for_account(&self, account_id: AccountId) -> Result<u64, StoreError>;

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, StoreError>;
}
