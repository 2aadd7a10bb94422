//! Application layer: shortening strategies orchestrating the domain.

pub mod strategy;
