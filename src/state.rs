use std::sync::Arc;

use anyhow::Context;
use axum::extract::FromRef;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::auth::{repo::PgCredentialStore, services::SessionService, store::CredentialStore};
use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<AppConfig>,
    pub sessions: SessionService,
}

impl FromRef<AppState> for SessionService {
    fn from_ref(state: &AppState) -> Self {
        state.sessions.clone()
    }
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env().context("load configuration")?);

        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;

        let store = Arc::new(PgCredentialStore::new(db.clone())) as Arc<dyn CredentialStore>;
        let sessions = SessionService::from_config(store, &config.jwt)
            .context("build session service")?;

        Ok(Self {
            db,
            config,
            sessions,
        })
    }

    /// State backed by the in-memory credential store and a lazy pool that
    /// never connects unless a link route is hit.
    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::auth::{jwt::JwtKeys, memory::MemoryCredentialStore, password::test_hasher};

        let config = Arc::new(crate::config::test_config());
        let db = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .expect("lazy pool ok");

        let sessions = SessionService::new(
            Arc::new(MemoryCredentialStore::new()),
            JwtKeys::from_config(&config.jwt),
            test_hasher(),
            time::Duration::minutes(config.jwt.refresh_ttl_minutes),
        )
        .expect("session service");

        Self {
            db,
            config,
            sessions,
        }
    }
}
