//! Bounded in-process LRU tier.

use async_trait::async_trait;
use lru::LruCache;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Mutex;

use crate::domain::entities::ShortUrl;
use crate::domain::repositories::ShortUrlRepository;
use crate::error::AppError;

/// Front-tier cache keyed by code, bounded by item count.
///
/// A reverse fingerprint-to-code map serves hash lookups; it is kept
/// coherent on insert and eviction. The mutex is held only for map
/// operations, never across I/O.
pub struct LruRepository {
    inner: Box<dyn ShortUrlRepository>,
    cache: Mutex<LruState>,
}

struct LruState {
    entries: LruCache<String, ShortUrl>,
    hashes: HashMap<String, String>,
}

impl LruRepository {
    /// Wraps `inner` with an LRU tier of the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; the caller disables the tier by not
    /// constructing it (see `server::build_repository`).
    pub fn new(inner: Box<dyn ShortUrlRepository>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).expect("LRU capacity must be non-zero");

        Self {
            inner,
            cache: Mutex::new(LruState {
                entries: LruCache::new(capacity),
                hashes: HashMap::new(),
            }),
        }
    }

    fn insert(&self, short_url: &ShortUrl) {
        let mut state = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(url_hash) = &short_url.url_hash {
            state
                .hashes
                .insert(url_hash.clone(), short_url.code.clone());
        }

        let evicted = state
            .entries
            .push(short_url.code.clone(), short_url.clone());

        // Keep the reverse map coherent with the evicted victim.
        if let Some((_, victim)) = evicted
            && victim.code != short_url.code
            && let Some(victim_hash) = &victim.url_hash
            && state.hashes.get(victim_hash) == Some(&victim.code)
        {
            state.hashes.remove(victim_hash);
        }
    }

    fn get_by_code(&self, code: &str) -> Option<ShortUrl> {
        let mut state = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        state.entries.get(code).cloned()
    }

    fn get_by_hash(&self, hash: &str) -> Option<ShortUrl> {
        let mut state = self
            .cache
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let code = state.hashes.get(hash)?.clone();

        state.entries.get(&code).cloned()
    }
}

#[async_trait]
impl ShortUrlRepository for LruRepository {
    async fn save(&self, short_url: &ShortUrl) -> Result<(), AppError> {
        self.inner.save(short_url).await?;

        self.insert(short_url);

        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<ShortUrl>, AppError> {
        if let Some(cached) = self.get_by_code(code) {
            return Ok(Some(cached));
        }

        let found = self.inner.find_by_code(code).await?;

        if let Some(short_url) = &found {
            self.insert(short_url);
        }

        Ok(found)
    }

    async fn find_by_hash(&self, hash: &str) -> Result<Option<ShortUrl>, AppError> {
        if let Some(cached) = self.get_by_hash(hash) {
            return Ok(Some(cached));
        }

        let found = self.inner.find_by_hash(hash).await?;

        if let Some(short_url) = &found {
            self.insert(short_url);
        }

        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockShortUrlRepository;
    use chrono::Utc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(code: &str, hash: Option<&str>) -> ShortUrl {
        ShortUrl::new(
            code.to_string(),
            format!("https://example.com/{code}"),
            hash.map(str::to_string),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_save_populates_cache() {
        let mut inner = MockShortUrlRepository::new();
        inner.expect_save().times(1).returning(|_| Ok(()));
        // find_by_code must not reach the inner tier after a save.
        inner.expect_find_by_code().times(0);

        let repo = LruRepository::new(Box::new(inner), 10);
        repo.save(&record("aaaa1111", None)).await.unwrap();

        let found = repo.find_by_code("aaaa1111").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn test_miss_falls_through_and_backfills() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_clone = hits.clone();

        let mut inner = MockShortUrlRepository::new();
        inner.expect_find_by_code().returning(move |code| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
            Ok(Some(record(code, None)))
        });

        let repo = LruRepository::new(Box::new(inner), 10);

        repo.find_by_code("bbbb2222").await.unwrap();
        repo.find_by_code("bbbb2222").await.unwrap();

        assert_eq!(hits.load(Ordering::SeqCst), 1, "second read should be cached");
    }

    #[tokio::test]
    async fn test_eviction_removes_exactly_the_oldest_entry() {
        let mut inner = MockShortUrlRepository::new();
        inner.expect_save().returning(|_| Ok(()));
        // Only the evicted entry falls through to the inner tier.
        inner
            .expect_find_by_code()
            .withf(|code| code == "old00001")
            .times(1)
            .returning(|code| Ok(Some(record(code, None))));

        let repo = LruRepository::new(Box::new(inner), 2);

        repo.save(&record("old00001", None)).await.unwrap();
        repo.save(&record("mid00002", None)).await.unwrap();
        repo.save(&record("new00003", None)).await.unwrap();

        // Still-resident entries are served from cache (no inner calls).
        assert!(repo.find_by_code("mid00002").await.unwrap().is_some());
        assert!(repo.find_by_code("new00003").await.unwrap().is_some());

        // The oldest one was evicted and must come from the inner tier.
        assert!(repo.find_by_code("old00001").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_hash_lookup_via_reverse_map() {
        let mut inner = MockShortUrlRepository::new();
        inner.expect_save().returning(|_| Ok(()));
        inner.expect_find_by_hash().times(0);

        let repo = LruRepository::new(Box::new(inner), 10);
        repo.save(&record("cccc3333", Some("deadbeef"))).await.unwrap();

        let found = repo.find_by_hash("deadbeef").await.unwrap().unwrap();
        assert_eq!(found.code, "cccc3333");
    }

    #[tokio::test]
    async fn test_eviction_cleans_reverse_map() {
        let mut inner = MockShortUrlRepository::new();
        inner.expect_save().returning(|_| Ok(()));
        inner
            .expect_find_by_hash()
            .withf(|hash| hash == "hash-old")
            .times(1)
            .returning(|_| Ok(None));

        let repo = LruRepository::new(Box::new(inner), 1);

        repo.save(&record("old00001", Some("hash-old"))).await.unwrap();
        repo.save(&record("new00002", Some("hash-new"))).await.unwrap();

        // The evicted record's fingerprint goes to the inner tier.
        assert!(repo.find_by_hash("hash-old").await.unwrap().is_none());
    }
}
