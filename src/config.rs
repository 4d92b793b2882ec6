//! Configuration Module
//!
//! Handles loading and managing data-layer configuration from environment variables.

use std::env;

/// Default TTL for cache entries: 30 days in milliseconds.
pub const DEFAULT_CACHE_TTL_MS: u64 = 30 * 24 * 60 * 60 * 1000;

/// Maximum replay attempts before an operation is permanently dropped.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Data-layer configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Namespace prefix for cache keys in the shared store
    pub cache_prefix: String,
    /// Default TTL in milliseconds for cache entries without explicit TTL
    pub cache_default_ttl_ms: u64,
    /// Storage key the serialized pending-operation list lives under
    pub queue_key: String,
    /// Maximum replay attempts per queued operation
    pub max_retries: u32,
    /// Address the connectivity probe connects to
    pub probe_addr: String,
    /// Seconds between connectivity probes
    pub probe_interval_secs: u64,
    /// Per-probe connect timeout in milliseconds
    pub probe_timeout_ms: u64,
}

impl SyncConfig {
    /// Creates a new SyncConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `LOCALSYNC_CACHE_PREFIX` - Cache key namespace (default: "cache:")
    /// - `LOCALSYNC_CACHE_TTL_MS` - Default cache TTL in ms (default: 30 days)
    /// - `LOCALSYNC_QUEUE_KEY` - Storage key for the queue blob (default: "offline_queue")
    /// - `LOCALSYNC_MAX_RETRIES` - Replay attempts per operation (default: 5)
    /// - `LOCALSYNC_PROBE_ADDR` - Probe target (default: "8.8.8.8:53")
    /// - `LOCALSYNC_PROBE_INTERVAL` - Probe frequency in seconds (default: 15)
    /// - `LOCALSYNC_PROBE_TIMEOUT_MS` - Probe connect timeout in ms (default: 2000)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_prefix: env::var("LOCALSYNC_CACHE_PREFIX").unwrap_or(defaults.cache_prefix),
            cache_default_ttl_ms: env::var("LOCALSYNC_CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.cache_default_ttl_ms),
            queue_key: env::var("LOCALSYNC_QUEUE_KEY").unwrap_or(defaults.queue_key),
            max_retries: env::var("LOCALSYNC_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_retries),
            probe_addr: env::var("LOCALSYNC_PROBE_ADDR").unwrap_or(defaults.probe_addr),
            probe_interval_secs: env::var("LOCALSYNC_PROBE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.probe_interval_secs),
            probe_timeout_ms: env::var("LOCALSYNC_PROBE_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.probe_timeout_ms),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            cache_prefix: "cache:".to_string(),
            cache_default_ttl_ms: DEFAULT_CACHE_TTL_MS,
            queue_key: "offline_queue".to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            probe_addr: "8.8.8.8:53".to_string(),
            probe_interval_secs: 15,
            probe_timeout_ms: 2000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SyncConfig::default();
        assert_eq!(config.cache_prefix, "cache:");
        assert_eq!(config.cache_default_ttl_ms, DEFAULT_CACHE_TTL_MS);
        assert_eq!(config.queue_key, "offline_queue");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.probe_interval_secs, 15);
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        env::remove_var("LOCALSYNC_CACHE_PREFIX");
        env::remove_var("LOCALSYNC_CACHE_TTL_MS");
        env::remove_var("LOCALSYNC_QUEUE_KEY");
        env::remove_var("LOCALSYNC_MAX_RETRIES");
        env::remove_var("LOCALSYNC_PROBE_ADDR");
        env::remove_var("LOCALSYNC_PROBE_INTERVAL");
        env::remove_var("LOCALSYNC_PROBE_TIMEOUT_MS");

        let config = SyncConfig::from_env();
        assert_eq!(config.cache_prefix, "cache:");
        assert_eq!(config.queue_key, "offline_queue");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.probe_addr, "8.8.8.8:53");
    }
}
