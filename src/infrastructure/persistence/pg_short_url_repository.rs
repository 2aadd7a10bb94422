//! PostgreSQL implementation of the short URL repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::ShortUrl;
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

/// Durable tier and source of truth for short URL records.
///
/// Inserts are idempotent on `code`: a conflicting insert is a no-op and
/// the first writer's record survives. A partial unique index on
/// `url_hash` keeps the hash-to-code mapping functional.
pub struct PgShortUrlRepository {
    pool: Arc<PgPool>,
}

impl PgShortUrlRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ShortUrlRow {
    code: String,
    original_url: String,
    url_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ShortUrlRow> for ShortUrl {
    fn from(row: ShortUrlRow) -> Self {
        ShortUrl::new(row.code, row.original_url, row.url_hash, row.created_at)
    }
}

#[async_trait]
impl ShortUrlRepository for PgShortUrlRepository {
    async fn save(&self, short_url: &ShortUrl) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO short_urls (code, original_url, url_hash, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (code) DO NOTHING
            "#,
        )
        .bind(&short_url.code)
        .bind(&short_url.original_url)
        .bind(&short_url.url_hash)
        .bind(short_url.created_at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrl>, AppError> {
        let row = sqlx::query_as::<_, ShortUrlRow>(
            r#"
            SELECT code, original_url, url_hash, created_at
            FROM short_urls
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ShortUrl::from))
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError> {
        let row = sqlx::query_as::<_, ShortUrlRow>(
            r#"
            SELECT code, original_url, url_hash, created_at
            FROM short_urls
            WHERE url_hash = $1
            "#,
        )
        .bind(hash)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(ShortUrl::from))
    }
}
