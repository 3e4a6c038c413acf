use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;

use crate::auth::store::AccountId;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Link {
    pub id: i64,
    pub url: String,
    pub short_url: String,
    pub count: i64,
    pub owner: AccountId,
    pub created_at: OffsetDateTime,
}

pub async fn create(
    db: &PgPool,
    url: &str,
    short_url: &str,
    owner: AccountId,
) -> Result<Link, sqlx::Error> {
    sqlx::query_as::<_, Link>(
        r#"
        INSERT INTO links (url, short_url, owner)
        VALUES ($1, $2, $3)
        RETURNING id, url, short_url, count, owner, created_at
        "#,
    )
    .bind(url)
    .bind(short_url)
    .bind(owner)
    .fetch_one(db)
    .await
}

/// Looks up a link and counts the hit in the same statement.
pub async fn resolve(db: &PgPool, short_url: &str) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>(
        r#"
        UPDATE links SET count = count + 1
        WHERE short_url = $1
        RETURNING url
        "#,
    )
    .bind(short_url)
    .fetch_optional(db)
    .await
}
