//! Connection events and the process-wide error channel.
//!
//! Uses a tokio broadcast channel so any number of supervisors can observe
//! connection lifecycle and persistence failures. Publishing with no
//! subscribers is not an error; the event is simply dropped.

use mongochrome_core::PersistenceError;
use tokio::sync::broadcast;
use tracing::{debug, error};

/// Event published by a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The connection was opened.
    Opened,
    /// A full sync finished; `collections` is the number of remote
    /// collections that were enumerated.
    Loaded { collections: usize },
    /// A backing-store operation failed.
    Error(PersistenceError),
}

impl ConnectionEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            ConnectionEvent::Opened => "opened",
            ConnectionEvent::Loaded { .. } => "loaded",
            ConnectionEvent::Error(_) => "error",
        }
    }
}

/// Broadcast channel for connection events.
#[derive(Debug, Clone)]
pub struct EventChannel {
    tx: broadcast::Sender<ConnectionEvent>,
}

impl EventChannel {
    /// Create a channel buffering up to `capacity` events per slow subscriber.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0; `MongochromeConfig::validate` rejects that.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event to all current subscribers.
    pub fn publish(&self, event: ConnectionEvent) {
        let event_type = event.event_type();
        match self.tx.send(event) {
            Ok(receivers) => debug!(event_type, receivers, "Published connection event"),
            Err(_) => debug!(event_type, "No subscribers for connection event"),
        }
    }

    /// Log a persistence failure and publish it as `ConnectionEvent::Error`.
    pub fn report(&self, err: PersistenceError) {
        error!(
            operation = %err.operation,
            collection = %err.collection,
            error = %err.reason,
            "Persistence operation failed"
        );
        self.publish(ConnectionEvent::Error(err));
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.tx.subscribe()
    }
}
