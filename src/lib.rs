//! localsync - An offline-first local data layer
//!
//! Provides a TTL cache and a durable offline write queue over a shared
//! durable key-value store, with network-aware replay on reconnect.

pub mod cache;
pub mod config;
pub mod error;
pub mod network;
pub mod queue;
pub mod storage;

pub use cache::CacheService;
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use network::{ConnectionStatus, NetworkChannel, NetworkMonitor, ProbeMonitor};
pub use queue::{ApplyOutcome, OfflineQueue, QueueStatus, QueuedOperation, RemoteExecutor};
pub use storage::{FileStorage, MemoryStorage, StorageBackend};
