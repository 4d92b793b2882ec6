//! Cache Envelope Module
//!
//! Defines the serialized wrapper for individual cache entries with TTL support.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

// == Cache Envelope ==
/// Wraps a cached payload with the metadata needed for expiry.
///
/// The TTL is fixed at write time, not sliding: reads never extend it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEnvelope<T> {
    /// The cached payload
    pub data: T,
    /// Write timestamp (Unix milliseconds)
    pub timestamp: u64,
    /// Milliseconds until expiry, counted from `timestamp`
    pub ttl_ms: u64,
}

impl<T> CacheEnvelope<T> {
    // == Constructor ==
    /// Wraps `data` with the current timestamp and the given TTL.
    pub fn new(data: T, ttl_ms: u64) -> Self {
        Self {
            data,
            timestamp: current_timestamp_ms(),
            ttl_ms,
        }
    }

    // == Is Expired ==
    /// Checks whether the envelope has outlived its TTL.
    ///
    /// Boundary condition: an entry is valid while `now - timestamp` is at
    /// most `ttl_ms`, and expired once the elapsed time strictly exceeds it.
    /// A `ttl_ms` of zero therefore admits reads within the same
    /// millisecond as the write.
    pub fn is_expired(&self) -> bool {
        current_timestamp_ms().saturating_sub(self.timestamp) > self.ttl_ms
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds, zero once expired.
    pub fn ttl_remaining_ms(&self) -> u64 {
        let elapsed = current_timestamp_ms().saturating_sub(self.timestamp);
        self.ttl_ms.saturating_sub(elapsed)
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_millis() as u64
}
