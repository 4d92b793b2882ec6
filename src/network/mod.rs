//! Network Module
//!
//! Connectivity status type, the transition channel, and the TCP probe
//! monitor.
//!
//! Consumers (the offline queue) take a [`NetworkMonitor`]: `current()` is
//! the synchronous "current status" fetch and the event stream delivers
//! every published transition in order. Transitions ride a broadcast
//! channel rather than a watch channel so a fast offline/online flap is
//! never coalesced into a single observation; the watch side exists only
//! for cheap current-status reads. Any producer works; tests drive a raw
//! [`NetworkChannel`] and production wires up a [`ProbeMonitor`].

mod probe;

use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, watch};

pub use probe::ProbeMonitor;

/// Transitions buffered per subscriber before the oldest are dropped.
/// Connectivity changes are rare; a lagging subscriber resyncs from the
/// current status.
const EVENT_BUFFER: usize = 64;

// == Connection Status ==
/// Connectivity as last observed by a monitor.
///
/// `Unknown` covers monitors that cannot (yet) tell; it gates queue drains
/// exactly like `Offline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Online,
    Offline,
    Unknown,
}

impl ConnectionStatus {
    /// True only for a definite `Online` observation.
    pub fn is_online(self) -> bool {
        matches!(self, ConnectionStatus::Online)
    }
}

// == Network Channel ==
/// Producer side of connectivity: records the current status and fans
/// every published transition out to all subscribers.
#[derive(Debug)]
pub struct NetworkChannel {
    status_tx: watch::Sender<ConnectionStatus>,
    event_tx: broadcast::Sender<ConnectionStatus>,
}

impl NetworkChannel {
    /// Creates a channel holding `initial` as the current status.
    pub fn new(initial: ConnectionStatus) -> Self {
        let (status_tx, _) = watch::channel(initial);
        let (event_tx, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            status_tx,
            event_tx,
        }
    }

    /// Publishes a status observation.
    ///
    /// The current status is updated even when nobody has subscribed yet;
    /// the event is fanned out to whichever subscribers exist.
    pub fn publish(&self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
        let _ = self.event_tx.send(status);
    }

    /// Returns the most recently published status.
    pub fn current(&self) -> ConnectionStatus {
        *self.status_tx.borrow()
    }

    /// Creates a monitor receiving the current status and all future
    /// transitions.
    pub fn subscribe(&self) -> NetworkMonitor {
        NetworkMonitor {
            status: self.status_tx.subscribe(),
            events: self.event_tx.subscribe(),
        }
    }
}

// == Network Monitor ==
/// Subscriber handle: current connectivity plus the ordered stream of
/// transitions published after `subscribe`.
#[derive(Debug)]
pub struct NetworkMonitor {
    pub(crate) status: watch::Receiver<ConnectionStatus>,
    pub(crate) events: broadcast::Receiver<ConnectionStatus>,
}

impl NetworkMonitor {
    /// Returns the current status without waiting.
    pub fn current(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Waits until the current status changes value.
    ///
    /// Errors when the producer side has been dropped.
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.status.changed().await
    }
}

impl Clone for NetworkMonitor {
    fn clone(&self) -> Self {
        Self {
            status: self.status.clone(),
            events: self.events.resubscribe(),
        }
    }
}
