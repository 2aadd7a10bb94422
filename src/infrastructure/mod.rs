//! Infrastructure layer: storage, cache tiers, and event transport.

pub mod analytics;
pub mod cache;
pub mod health;
pub mod messaging;
pub mod persistence;
