//! Offline Queue Module
//!
//! Durable FIFO queue for remote writes attempted while offline, replayed
//! on reconnect with bounded retries and duplicate tolerance.
//!
//! The pending list is the sole source of truth for unsent writes; it is
//! persisted as a single serialized blob under one storage key, owned and
//! written exclusively by [`OfflineQueue`].

mod operation;
mod service;

// Re-export public types
pub use operation::{ApplyOutcome, QueuedOperation, RemoteExecutor};
pub use service::{OfflineQueue, QueueStatus};
