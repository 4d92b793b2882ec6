//! Queued Operation Module
//!
//! Defines the persisted operation record and the remote-executor boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// == Queued Operation ==
/// A remote write waiting to be applied.
///
/// `O` is the application's operation type, a closed enum carrying one
/// strongly-typed payload per variant; the executor dispatches on it with
/// an exhaustive match. The queue itself never inspects the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedOperation<O> {
    /// Unique id, generated at enqueue time
    pub id: String,
    /// The operation to replay against the remote store
    pub op: O,
    /// When the operation was enqueued (informational, not expiry)
    pub timestamp: DateTime<Utc>,
    /// Failed replay attempts so far
    pub retry_count: u32,
}

impl<O> QueuedOperation<O> {
    // == Constructor ==
    /// Wraps `op` with a fresh id, the current time, and zero retries.
    pub fn new(op: O) -> Self {
        let now = Utc::now();
        Self {
            id: format!("{}-{}", now.timestamp_millis(), Uuid::new_v4().simple()),
            op,
            timestamp: now,
            retry_count: 0,
        }
    }
}

// == Apply Outcome ==
/// Successful outcomes of applying an operation remotely.
///
/// `Duplicate` means the remote store recognized the write as already
/// applied (e.g. a uniqueness-constraint violation on an idempotency key).
/// The queue treats it exactly like `Applied`: the persist-after-apply gap
/// means a crashed pass can replay an operation that already landed, and
/// that replay must not count as a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The remote write was applied
    Applied,
    /// The remote store reports the write already exists
    Duplicate,
}

// == Remote Executor Trait ==
/// Boundary to the remote store.
///
/// Any `Err` is a transient failure and counts against the operation's
/// retry budget. Executors are responsible for their own request timeouts;
/// the queue does not bound the call.
#[async_trait]
pub trait RemoteExecutor<O>: Send + Sync {
    /// Attempts to apply `op` to the remote store.
    async fn apply(&self, op: &O) -> anyhow::Result<ApplyOutcome>;
}
