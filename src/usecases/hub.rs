//! Subscription Broadcast Hub - Fan-out to Live Connections
//!
//! Registry of open WebSocket connections. Events are serialized once
//! and pushed to every connection through a bounded per-connection
//! queue with `try_send`: a closed or backed-up connection is pruned
//! on the spot and never delays delivery to the others or the
//! scanner that emitted the event.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use alloy::primitives::Address;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::events::{BroadcastEvent, ControlReply};

/// Outbound messages queued per connection before the socket task
/// drains them. A connection that falls this far behind is dropped.
const OUTBOUND_QUEUE: usize = 256;

/// One registered client connection.
struct ClientConnection {
    /// Queue drained by the connection's socket task.
    sender: mpsc::Sender<String>,
    /// Markets the client declared interest in. Bookkeeping only:
    /// delivery is deliberately unfiltered (upstream protocol
    /// behavior); see DESIGN.md.
    subscribed_markets: Mutex<HashSet<Address>>,
}

/// Registry of live connections with non-blocking fan-out.
pub struct BroadcastHub {
    connections: dashmap::DashMap<Uuid, ClientConnection>,
    /// Cumulative broadcast calls (for metrics exposition).
    events_broadcast: AtomicU64,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self {
            connections: dashmap::DashMap::new(),
            events_broadcast: AtomicU64::new(0),
        }
    }

    /// Add a connection. Returns its id and the receiving half the
    /// socket task drains.
    pub fn register(&self) -> (Uuid, mpsc::Receiver<String>) {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        self.connections.insert(
            id,
            ClientConnection {
                sender: tx,
                subscribed_markets: Mutex::new(HashSet::new()),
            },
        );
        info!(connection = %id, total = self.connections.len(), "client connected");
        (id, rx)
    }

    /// Remove a connection (close, error, or prune).
    pub fn remove(&self, id: Uuid) {
        if self.connections.remove(&id).is_some() {
            info!(connection = %id, total = self.connections.len(), "client removed");
        }
    }

    /// Replace a connection's declared subscription set and build the
    /// acknowledgement reply.
    pub fn set_subscriptions(&self, id: Uuid, markets: Vec<Address>) -> Option<ControlReply> {
        let entry = self.connections.get(&id)?;
        let mut subscribed = entry
            .subscribed_markets
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *subscribed = markets.iter().copied().collect();
        debug!(connection = %id, markets = markets.len(), "subscription set updated");
        Some(ControlReply::Subscribed { markets })
    }

    /// Deliver an event to every live connection.
    ///
    /// Serializes once. Send failures are isolated: the offending
    /// connection is pruned after the fan-out and the remaining
    /// connections still receive the event.
    pub fn broadcast(&self, event: &BroadcastEvent) {
        self.events_broadcast.fetch_add(1, Ordering::Relaxed);

        let payload = match serde_json::to_string(event) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "failed to serialize broadcast event");
                return;
            }
        };

        let mut dead: Vec<Uuid> = Vec::new();
        for entry in &self.connections {
            match entry.value().sender.try_send(payload.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(connection = %entry.key(), "client queue full, pruning slow connection");
                    dead.push(*entry.key());
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!(connection = %entry.key(), "client queue closed, pruning");
                    dead.push(*entry.key());
                }
            }
        }

        // Prune outside the iteration: DashMap removal during iter
        // over the same shard deadlocks.
        for id in dead {
            self.remove(id);
        }
    }

    /// Number of live connections.
    pub fn client_count(&self) -> usize {
        self.connections.len()
    }

    /// Cumulative broadcast calls.
    pub fn events_broadcast(&self) -> u64 {
        self.events_broadcast.load(Ordering::Relaxed)
    }
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}
