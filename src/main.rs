use std::time::Duration;

use time::OffsetDateTime;

mod app;
mod auth;
mod config;
mod links;
mod state;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "cascade=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    sqlx::migrate!("./migrations").run(&app_state.db).await?;
    tracing::info!("database connected and migrated");

    spawn_session_sweep(&app_state);

    app::serve(app::build_app(app_state)).await
}

/// Periodically deletes session rows whose refresh token has expired.
fn spawn_session_sweep(state: &AppState) {
    let every = state.config.session_sweep_seconds;
    if every == 0 {
        tracing::info!("expired-session sweep disabled");
        return;
    }
    let store = state.sessions.store().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(every));
        loop {
            interval.tick().await;
            match store.delete_expired_sessions(OffsetDateTime::now_utc()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(deleted = n, "expired sessions swept"),
                Err(e) => tracing::warn!(error = %e, "session sweep failed"),
            }
        }
    });
}
