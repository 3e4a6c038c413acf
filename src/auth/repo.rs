use async_trait::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;

use crate::auth::store::{
    Account, AccountId, CredentialStore, NewAccount, NewSession, Session, SessionId, StoreError,
};

/// Postgres-backed credential store.
#[derive(Clone)]
pub struct PgCredentialStore {
    db: PgPool,
}

impl PgCredentialStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn map_write_error(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            return StoreError::Conflict;
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, verified, created_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, password_hash, verified, created_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (email, password_hash, verified)
            VALUES ($1, $2, FALSE)
            RETURNING id, email, password_hash, verified, created_at
            "#,
        )
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn update_account_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(r#"UPDATE accounts SET password_hash = $1 WHERE id = $2"#)
            .bind(password_hash)
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn insert_session(&self, session: NewSession) -> Result<Session, StoreError> {
        sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (account_id, refresh_token_hash, ip_address, user_agent, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, account_id, refresh_token_hash, ip_address, user_agent, expires_at, created_at
            "#,
        )
        .bind(session.account_id)
        .bind(&session.refresh_token_hash)
        .bind(&session.ip_address)
        .bind(&session.user_agent)
        .bind(session.expires_at)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)
    }

    async fn find_active_sessions_for_account(
        &self,
        account_id: AccountId,
        now: OffsetDateTime,
    ) -> Result<Vec<Session>, StoreError> {
        let rows = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, account_id, refresh_token_hash, ip_address, user_agent, expires_at, created_at
            FROM sessions
            WHERE account_id = $1 AND expires_at > $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(account_id)
        .bind(now)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM sessions WHERE id = $1"#)
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_sessions_for_account(&self, account_id: AccountId) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE account_id = $1"#)
            .bind(account_id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM sessions WHERE expires_at <= $1"#)
            .bind(now)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}
