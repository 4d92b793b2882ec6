//! TCP Probe Monitor
//!
//! Background task that periodically probes a known endpoint to decide
//! whether the process is online, publishing transitions over a
//! [`NetworkChannel`].

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::network::{ConnectionStatus, NetworkChannel, NetworkMonitor};

// == Probe Monitor ==
/// Owns the connectivity channel and the probe loop task.
///
/// Starts at `Unknown` until the first probe completes; the queue treats
/// that as offline, so nothing drains on a stale assumption. Only actual
/// changes are published as transitions.
#[derive(Debug)]
pub struct ProbeMonitor {
    channel: Arc<NetworkChannel>,
    handle: JoinHandle<()>,
}

impl ProbeMonitor {
    /// Starts probing `config.probe_addr` every `config.probe_interval_secs`.
    ///
    /// The first probe runs immediately rather than after one interval, so
    /// startup code sees a real status as soon as the endpoint answers.
    pub fn start(config: &SyncConfig) -> Self {
        let channel = Arc::new(NetworkChannel::new(ConnectionStatus::Unknown));
        let addr = config.probe_addr.clone();
        let interval = Duration::from_secs(config.probe_interval_secs);
        let timeout = Duration::from_millis(config.probe_timeout_ms);

        let ch = Arc::clone(&channel);
        let handle = tokio::spawn(async move {
            info!("Starting connectivity probe against {}", addr);
            loop {
                let status = probe_once(&addr, timeout).await;
                let previous = ch.current();
                if status != previous {
                    info!("Connectivity changed: {:?} -> {:?}", previous, status);
                    ch.publish(status);
                } else {
                    debug!("Connectivity unchanged: {:?}", status);
                }
                tokio::time::sleep(interval).await;
            }
        });

        Self { channel, handle }
    }

    /// Returns a monitor for the current and future connectivity status.
    pub fn subscribe(&self) -> NetworkMonitor {
        self.channel.subscribe()
    }

    /// Stops the probe loop.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ProbeMonitor {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Single connectivity check: a bounded TCP connect to the probe endpoint.
async fn probe_once(addr: &str, timeout: Duration) -> ConnectionStatus {
    match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => ConnectionStatus::Online,
        _ => ConnectionStatus::Offline,
    }
}
