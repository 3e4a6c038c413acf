//! In-memory credential store used by the test suites.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::auth::store::{
    Account, AccountId, CredentialStore, NewAccount, NewSession, Session, SessionId, StoreError,
};

#[derive(Default)]
struct Tables {
    accounts: BTreeMap<AccountId, Account>,
    sessions: BTreeMap<SessionId, Session>,
    next_account_id: AccountId,
    next_session_id: SessionId,
}

#[derive(Default)]
pub struct MemoryCredentialStore {
    tables: Mutex<Tables>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_count(&self) -> usize {
        self.tables.lock().expect("store lock").sessions.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_account_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.lock().expect("store lock");
        Ok(tables.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let tables = self.tables.lock().expect("store lock");
        Ok(tables.accounts.get(&id).cloned())
    }

    async fn insert_account(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        if tables.accounts.values().any(|a| a.email == account.email) {
            return Err(StoreError::Conflict);
        }
        tables.next_account_id += 1;
        let record = Account {
            id: tables.next_account_id,
            email: account.email,
            password_hash: account.password_hash,
            verified: false,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.accounts.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_account_password(
        &self,
        id: AccountId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        let account = tables.accounts.get_mut(&id).ok_or(StoreError::NotFound)?;
        account.password_hash = password_hash.to_owned();
        Ok(())
    }

    async fn insert_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        tables.next_session_id += 1;
        let record = Session {
            id: tables.next_session_id,
            account_id: session.account_id,
            refresh_token_hash: session.refresh_token_hash,
            ip_address: session.ip_address,
            user_agent: session.user_agent,
            expires_at: session.expires_at,
            created_at: OffsetDateTime::now_utc(),
        };
        tables.sessions.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_active_sessions_for_account(
        &self,
        account_id: AccountId,
        now: OffsetDateTime,
    ) -> Result<Vec<Session>, StoreError> {
        let tables = self.tables.lock().expect("store lock");
        Ok(tables
            .sessions
            .values()
            .filter(|s| s.account_id == account_id && s.is_active(now))
            .cloned()
            .collect())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StoreError> {
        self.tables.lock().expect("store lock").sessions.remove(&id);
        Ok(())
    }

    async fn delete_sessions_for_account(&self, account_id: AccountId) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.account_id != account_id);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn delete_expired_sessions(&self, now: OffsetDateTime) -> Result<u64, StoreError> {
        let mut tables = self.tables.lock().expect("store lock");
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.is_active(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn new_session(account_id: AccountId, expires_at: OffsetDateTime) -> NewSession {
        NewSession {
            account_id,
            refresh_token_hash: "hash".into(),
            ip_address: String::new(),
            user_agent: String::new(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn insert_account_rejects_duplicate_email() {
        let store = MemoryCredentialStore::new();
        let account = NewAccount {
            email: "a@x.com".into(),
            password_hash: "h".into(),
        };
        store.insert_account(account.clone()).await.expect("first insert");
        let err = store.insert_account(account).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict));
    }

    #[tokio::test]
    async fn email_lookup_is_case_sensitive() {
        let store = MemoryCredentialStore::new();
        store
            .insert_account(NewAccount {
                email: "a@x.com".into(),
                password_hash: "h".into(),
            })
            .await
            .expect("insert");
        assert!(store.find_account_by_email("A@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_sessions_exclude_expired_rows() {
        let store = MemoryCredentialStore::new();
        let now = OffsetDateTime::now_utc();
        store.insert_session(new_session(1, now + Duration::hours(1))).await.unwrap();
        store.insert_session(new_session(1, now)).await.unwrap();
        store.insert_session(new_session(2, now + Duration::hours(1))).await.unwrap();

        let active = store.find_active_sessions_for_account(1, now).await.unwrap();
        assert_eq!(active.len(), 1);

        let swept = store.delete_expired_sessions(now).await.unwrap();
        assert_eq!(swept, 1);
        assert_eq!(store.session_count(), 2);
    }
}
