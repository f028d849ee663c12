//! Subscriber registry
//!
//! Holds the clients that receive broadcast events. Each client has a
//! bounded queue. A client is dropped the first time a delivery to it fails:
//! either its receiver is gone, or its queue is full because it stopped
//! reading. Dropping a lagging client ends its stream once the queued events
//! drain, and the client may register again.

use tempo_common::PlayerEvent;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;
use uuid::Uuid;

/// Opaque subscriber identity
pub type ClientId = Uuid;

/// Delivery endpoint for one subscriber
pub type EventSender = mpsc::Sender<PlayerEvent>;

/// Receiving end of a subscriber queue
pub type EventReceiver = mpsc::Receiver<PlayerEvent>;

/// Result of one broadcast pass
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Clients that accepted the event
    pub delivered: usize,
    /// Clients removed because delivery failed
    pub pruned: Vec<ClientId>,
}

#[derive(Default)]
pub struct ClientRegistry {
    clients: Vec<(ClientId, EventSender)>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber. Callers register each id once.
    pub fn register(&mut self, id: ClientId, sender: EventSender) {
        self.clients.push((id, sender));
        debug!("Client {} registered ({} total)", id, self.clients.len());
    }

    /// Remove a subscriber; unknown ids are ignored
    pub fn unregister(&mut self, id: ClientId) -> bool {
        let before = self.clients.len();
        self.clients.retain(|(client_id, _)| *client_id != id);
        let removed = self.clients.len() != before;
        if removed {
            debug!("Client {} unregistered ({} total)", id, self.clients.len());
        }
        removed
    }

    /// Deliver `event` to every subscriber.
    ///
    /// Failed deliveries are collected during the pass and pruned after it,
    /// so one dead client never prevents delivery to the rest.
    pub fn broadcast(&mut self, event: &PlayerEvent) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        for (id, sender) in &self.clients {
            match sender.try_send(event.clone()) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!("Client {} queue is full", id);
                    report.pruned.push(*id);
                }
                Err(TrySendError::Closed(_)) => report.pruned.push(*id),
            }
        }

        if !report.pruned.is_empty() {
            self.clients.retain(|(id, _)| !report.pruned.contains(id));
            for id in &report.pruned {
                debug!("Pruned unreachable client {}", id);
            }
        }

        report
    }

    pub fn contains(&self, id: ClientId) -> bool {
        self.clients.iter().any(|(client_id, _)| *client_id == id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}
