//! Offline Queue Service
//!
//! Durable write queue with network-aware replay.
//!
//! Reads and writes of the pending list are serialized through an async
//! mutex; entry into a drain pass is guarded by an atomic compare-and-swap
//! so concurrent triggers (enqueue, reconnect, manual) collapse into the
//! pass already in flight.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SyncConfig;
use crate::network::{ConnectionStatus, NetworkMonitor};
use crate::queue::{ApplyOutcome, QueuedOperation, RemoteExecutor};
use crate::storage::StorageBackend;

// == Queue Status ==
/// Read-only diagnostic snapshot of the queue.
#[derive(Debug, Clone, Serialize)]
pub struct QueueStatus {
    /// Operations currently pending replay
    pub queue_size: usize,
    /// Last observed connectivity (definite Online only)
    pub is_online: bool,
    /// Whether a drain pass is in flight
    pub is_syncing: bool,
}

// == Offline Queue ==
/// Persists remote writes that cannot be applied yet and replays them in
/// FIFO order once connectivity returns.
///
/// The caller's contract for [`enqueue`](OfflineQueue::enqueue) is "this
/// write is durably queued", never "this write has reached the server";
/// replay outcomes are logged, not surfaced. The only data loss under
/// normal operation is an operation exceeding its retry budget, logged at
/// error severity.
pub struct OfflineQueue<O> {
    storage: Arc<dyn StorageBackend>,
    executor: Arc<dyn RemoteExecutor<O>>,
    network: watch::Receiver<ConnectionStatus>,
    queue_key: String,
    max_retries: u32,
    pending: Mutex<Vec<QueuedOperation<O>>>,
    syncing: AtomicBool,
    me: Weak<Self>,
    watcher: std::sync::Mutex<Option<JoinHandle<()>>>,
}

impl<O> OfflineQueue<O>
where
    O: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    // == Startup ==
    /// Loads persisted operations, subscribes to connectivity transitions,
    /// and drains immediately when starting online with a non-empty queue.
    ///
    /// A corrupt persisted blob is discarded: startup must not fail on bad
    /// queue data, at the documented cost of losing those unreplayed
    /// writes.
    pub async fn start(
        storage: Arc<dyn StorageBackend>,
        executor: Arc<dyn RemoteExecutor<O>>,
        network: NetworkMonitor,
        config: &SyncConfig,
    ) -> Arc<Self> {
        let pending = load_pending(storage.as_ref(), &config.queue_key).await;
        let loaded = pending.len();
        if loaded > 0 {
            info!("Loaded {} pending operations from storage", loaded);
        }

        let NetworkMonitor { status, mut events } = network;

        let queue = Arc::new_cyclic(|me| Self {
            storage,
            executor,
            network: status,
            queue_key: config.queue_key.clone(),
            max_retries: config.max_retries,
            pending: Mutex::new(pending),
            syncing: AtomicBool::new(false),
            me: me.clone(),
            watcher: std::sync::Mutex::new(None),
        });

        // Reconnect watcher: fires one drain per offline->online edge.
        // Repeated "online" notifications while already online are ignored.
        // The baseline is captured here, before the task is spawned, so a
        // transition published before its first poll still counts as an
        // edge against the status at startup.
        let mut was_online = queue.is_online();
        let weak = Arc::downgrade(&queue);
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(status) => {
                        let is_online = status.is_online();
                        if is_online && !was_online {
                            let Some(q) = weak.upgrade() else { break };
                            info!("Connectivity restored, draining offline queue");
                            q.process_queue().await;
                        }
                        was_online = is_online;
                    }
                    Err(RecvError::Lagged(missed)) => {
                        // Edges were lost; resync from the current status
                        // and drain if online, which is a no-op when empty.
                        warn!("Missed {} connectivity transitions", missed);
                        let Some(q) = weak.upgrade() else { break };
                        was_online = q.is_online();
                        if was_online {
                            q.process_queue().await;
                        }
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
        *queue
            .watcher
            .lock()
            .expect("watcher lock poisoned") = Some(handle);

        if loaded > 0 && queue.is_online() {
            let q = Arc::clone(&queue);
            tokio::spawn(async move { q.process_queue().await });
        }

        queue
    }

    fn is_online(&self) -> bool {
        self.network.borrow().is_online()
    }

    // == Enqueue ==
    /// Durably queues `op` for replay, then fires a background drain pass
    /// if currently online.
    ///
    /// Returns once the operation is appended and the list persisted; it
    /// never blocks on, or reports, the replay outcome.
    pub async fn enqueue(&self, op: O) {
        let queued = QueuedOperation::new(op);
        debug!("Enqueued operation {}", queued.id);
        {
            let mut pending = self.pending.lock().await;
            pending.push(queued);
            self.persist(&pending).await;
        }

        if self.is_online() {
            if let Some(q) = self.me.upgrade() {
                tokio::spawn(async move { q.process_queue().await });
            }
        }
    }

    // == Drain Pass ==
    /// Replays the current snapshot of the queue in FIFO order.
    ///
    /// No-op when a pass is already running, the device is offline (or
    /// connectivity is unknown), or the queue is empty. A failed operation
    /// does not block the rest of the snapshot; its retry happens on the
    /// next pass. Operations enqueued while the pass runs are left for the
    /// next pass, so FIFO holds within a snapshot rather than across
    /// concurrent enqueues.
    pub async fn process_queue(&self) {
        if self
            .syncing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("Drain pass already in flight");
            return;
        }
        let _guard = DrainGuard(&self.syncing);

        if !self.is_online() {
            debug!("Not online, skipping drain pass");
            return;
        }

        let snapshot: Vec<QueuedOperation<O>> = self.pending.lock().await.clone();
        if snapshot.is_empty() {
            return;
        }
        info!("Draining offline queue: {} operations", snapshot.len());

        let mut dropped: HashSet<String> = HashSet::new();
        let mut failed: HashMap<String, u32> = HashMap::new();

        for op in &snapshot {
            match self.executor.apply(&op.op).await {
                Ok(ApplyOutcome::Applied) => {
                    debug!("Applied operation {}", op.id);
                    dropped.insert(op.id.clone());
                }
                Ok(ApplyOutcome::Duplicate) => {
                    debug!("Operation {} already applied remotely", op.id);
                    dropped.insert(op.id.clone());
                }
                Err(e) => {
                    let attempts = op.retry_count + 1;
                    if attempts >= self.max_retries {
                        error!(
                            "Dropping operation {} after {} failed attempts: {}",
                            op.id, attempts, e
                        );
                        dropped.insert(op.id.clone());
                    } else {
                        warn!(
                            "Replay of {} failed (attempt {}/{}): {}",
                            op.id, attempts, self.max_retries, e
                        );
                        failed.insert(op.id.clone(), attempts);
                    }
                }
            }
        }

        // Merge results back into the live list. Matching by id keeps
        // operations enqueued mid-pass untouched.
        let mut pending = self.pending.lock().await;
        pending.retain(|op| !dropped.contains(&op.id));
        for op in pending.iter_mut() {
            if let Some(&attempts) = failed.get(&op.id) {
                op.retry_count = attempts;
            }
        }
        self.persist(&pending).await;
    }

    // == Status ==
    /// Returns the current diagnostic snapshot. Read-only, no side effects.
    pub async fn status(&self) -> QueueStatus {
        QueueStatus {
            queue_size: self.pending.lock().await.len(),
            is_online: self.is_online(),
            is_syncing: self.syncing.load(Ordering::SeqCst),
        }
    }

    // == Clear ==
    /// Discards every pending operation and persists the empty list.
    ///
    /// Administrative escape hatch: this is explicit, unconditional data
    /// loss.
    pub async fn clear_queue(&self) {
        let mut pending = self.pending.lock().await;
        if !pending.is_empty() {
            warn!("Discarding {} pending operations", pending.len());
        }
        pending.clear();
        self.persist(&pending).await;
    }

    // == Shutdown ==
    /// Stops the reconnect watcher. Pending operations stay persisted.
    pub fn shutdown(&self) {
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }

    /// Persists the full pending list as one blob under the queue key.
    /// Failures are logged at error severity and never propagated; the
    /// in-memory list stays authoritative and the next persist retries.
    async fn persist(&self, pending: &[QueuedOperation<O>]) {
        match serde_json::to_string(pending) {
            Ok(raw) => {
                if let Err(e) = self.storage.set(&self.queue_key, &raw).await {
                    error!("Failed to persist offline queue: {}", e);
                }
            }
            Err(e) => error!("Failed to serialize offline queue: {}", e),
        }
    }
}

impl<O> Drop for OfflineQueue<O> {
    fn drop(&mut self) {
        if let Ok(mut watcher) = self.watcher.lock() {
            if let Some(handle) = watcher.take() {
                handle.abort();
            }
        }
    }
}

/// Clears the single-flight flag when a drain pass ends, on every path out.
struct DrainGuard<'a>(&'a AtomicBool);

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Loads the persisted operation list, degrading to empty on any failure.
async fn load_pending<O: DeserializeOwned>(
    storage: &dyn StorageBackend,
    key: &str,
) -> Vec<QueuedOperation<O>> {
    match storage.get(key).await {
        Ok(Some(raw)) => match serde_json::from_str(&raw) {
            Ok(ops) => ops,
            Err(e) => {
                error!(
                    "Corrupt queue blob under {}: {}; discarding pending writes",
                    key, e
                );
                Vec::new()
            }
        },
        Ok(None) => Vec::new(),
        Err(e) => {
            warn!("Failed to load queue blob under {}: {}", key, e);
            Vec::new()
        }
    }
}
