//! Cache tiers layered over the durable repository.
//!
//! Composition is outermost-first: optional LRU, then Redis cache-aside,
//! then Postgres. Each tier implements the same
//! [`crate::domain::repositories::ShortUrlRepository`] trait and wraps the
//! next one by explicit construction.

mod lru_repository;
mod redis_repository;

pub use lru_repository::LruRepository;
pub use redis_repository::RedisCacheRepository;
