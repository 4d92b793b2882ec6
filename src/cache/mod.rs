//! Cache Module
//!
//! Read-through, write-through TTL caching over a durable storage backend.
//!
//! Expiry is lazy: expired entries are deleted on the read that finds them
//! stale, never by a background sweep. Every failure path degrades to a
//! cache miss; callers must treat cached data as recomputable, never as the
//! source of truth.

mod envelope;
mod service;


// Re-export public types
pub use envelope::{current_timestamp_ms, CacheEnvelope};
pub use service::CacheService;
