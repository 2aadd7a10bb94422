//! URL shortening strategies.
//!
//! Two strategies share the [`ShortenStrategy`] trait: the token strategy
//! mints a fresh code on every call; the hash strategy deduplicates by the
//! fingerprint of the normalized URL.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;

use crate::domain::entities::ShortUrl;
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;
use crate::utils::code_generator::CodeGenerator;
use crate::utils::url_normalizer::{hash_url, normalize_url};

/// Names the configured strategies. Requests select one by name; an
/// empty or missing name falls back to [`StrategyKind::Token`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Token,
    Hash,
}

impl StrategyKind {
    /// Parses a client-supplied strategy name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "token" => Some(Self::Token),
            "hash" => Some(Self::Hash),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Token => "token",
            Self::Hash => "hash",
        }
    }
}

/// A URL shortening strategy.
#[async_trait]
pub trait ShortenStrategy: Send + Sync {
    /// Shortens a URL, returning the persisted record.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for unparseable URLs (hash
    /// strategy only) and [`AppError::Internal`] on storage failure.
    async fn shorten(&self, url: &str) -> Result<ShortUrl, AppError>;
}

/// Always generates a new code; identical URLs produce distinct records.
pub struct TokenStrategy {
    store: Arc<dyn ShortUrlRepository>,
    generator: CodeGenerator,
}

impl TokenStrategy {
    pub fn new(store: Arc<dyn ShortUrlRepository>, generator: CodeGenerator) -> Self {
        Self { store, generator }
    }
}

#[async_trait]
impl ShortenStrategy for TokenStrategy {
    async fn shorten(&self, url: &str) -> Result<ShortUrl, AppError> {
        let short_url = ShortUrl::new(
            self.generator.generate(),
            url.to_string(),
            None,
            Utc::now(),
        );

        self.store.save(&short_url).await?;

        Ok(short_url)
    }
}

/// Deduplicates URLs: equivalent spellings of one URL share a code.
///
/// The lookup-then-save window is racy; concurrent first-time requests for
/// the same URL may both construct records, but the durable tier keeps the
/// first writer and subsequent hash lookups converge on it.
pub struct HashStrategy {
    store: Arc<dyn ShortUrlRepository>,
    generator: CodeGenerator,
}

impl HashStrategy {
    pub fn new(store: Arc<dyn ShortUrlRepository>, generator: CodeGenerator) -> Self {
        Self { store, generator }
    }
}

#[async_trait]
impl ShortenStrategy for HashStrategy {
    async fn shorten(&self, url: &str) -> Result<ShortUrl, AppError> {
        let normalized = normalize_url(url)
            .map_err(|e| AppError::bad_request("Invalid URL", json!({ "reason": e.to_string() })))?;

        let url_hash = hash_url(&normalized);

        if let Some(existing) = self.store.find_by_hash(&url_hash).await? {
            return Ok(existing);
        }

        let short_url = ShortUrl::new(
            self.generator.generate(),
            url.to_string(),
            Some(url_hash),
            Utc::now(),
        );

        self.store.save(&short_url).await?;

        Ok(short_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockShortUrlRepository;

    #[tokio::test]
    async fn test_token_strategy_saves_record_without_hash() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_save()
            .withf(|record| record.url_hash.is_none() && record.code.len() == 8)
            .times(1)
            .returning(|_| Ok(()));

        let strategy = TokenStrategy::new(Arc::new(repo), CodeGenerator::default());
        let record = strategy.shorten("https://example.com/a").await.unwrap();

        assert_eq!(record.original_url, "https://example.com/a");
        assert!(record.url_hash.is_none());
    }

    #[tokio::test]
    async fn test_token_strategy_surfaces_storage_error() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_save()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let strategy = TokenStrategy::new(Arc::new(repo), CodeGenerator::default());
        let result = strategy.shorten("https://example.com/a").await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }

    #[tokio::test]
    async fn test_hash_strategy_returns_existing_record() {
        let existing = ShortUrl::new(
            "existing1".to_string(),
            "https://example.com/p".to_string(),
            Some(hash_url(&normalize_url("https://example.com/p").unwrap())),
            Utc::now(),
        );

        let returned = existing.clone();
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_hash()
            .times(1)
            .returning(move |_| Ok(Some(returned.clone())));
        repo.expect_save().times(0);

        let strategy = HashStrategy::new(Arc::new(repo), CodeGenerator::default());

        // A different spelling of the same URL resolves to the stored record.
        let record = strategy.shorten("HTTPS://EXAMPLE.COM/p/").await.unwrap();

        assert_eq!(record, existing);
    }

    #[tokio::test]
    async fn test_hash_strategy_creates_record_on_miss() {
        let expected_hash = hash_url(&normalize_url("https://example.com/new").unwrap());
        let check_hash = expected_hash.clone();
        let lookup_hash = expected_hash.clone();

        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_hash()
            .withf(move |hash| hash == lookup_hash)
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_save()
            .withf(move |record| record.url_hash.as_deref() == Some(check_hash.as_str()))
            .times(1)
            .returning(|_| Ok(()));

        let strategy = HashStrategy::new(Arc::new(repo), CodeGenerator::default());
        let record = strategy.shorten("https://example.com/new").await.unwrap();

        // The stored URL is the raw input, not the normalized form.
        assert_eq!(record.original_url, "https://example.com/new");
        assert!(record.url_hash.is_some());
    }

    #[tokio::test]
    async fn test_hash_strategy_rejects_invalid_url() {
        let repo = MockShortUrlRepository::new();
        let strategy = HashStrategy::new(Arc::new(repo), CodeGenerator::default());

        let result = strategy.shorten("not a url").await;

        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_hash_strategy_surfaces_lookup_error() {
        let mut repo = MockShortUrlRepository::new();
        repo.expect_find_by_hash()
            .returning(|_| Err(AppError::internal("Database error", json!({}))));

        let strategy = HashStrategy::new(Arc::new(repo), CodeGenerator::default());
        let result = strategy.shorten("https://example.com/x").await;

        assert!(matches!(result, Err(AppError::Internal { .. })));
    }
}
