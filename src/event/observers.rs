// src/event/observers.rs

//! Append-only observer registry shared by every job of an orchestrator.

use std::fmt;
use std::sync::{Arc, RwLock};

use tokio::sync::broadcast;
use tracing::debug;

use super::relay::RelayedEvent;

/// Synchronous event handler.
pub type EventHandler = Arc<dyn Fn(&RelayedEvent) + Send + Sync>;

/// Ordered list of observers.
///
/// Handlers are only ever appended (until [`ObserverRegistry::clear`] at
/// shutdown). Dispatch works on a snapshot of the list, so a handler added
/// while an event is being delivered sees the next event, and concurrent
/// jobs can dispatch at the same time.
#[derive(Clone, Default)]
pub struct ObserverRegistry {
    handlers: Arc<RwLock<Vec<EventHandler>>>,
}

impl fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler. It receives every event dispatched after this call.
    pub fn register<F>(&self, handler: F)
    where
        F: Fn(&RelayedEvent) + Send + Sync + 'static,
    {
        let mut handlers = self.handlers.write().unwrap_or_else(|e| e.into_inner());
        handlers.push(Arc::new(handler));
        debug!(count = handlers.len(), "registered event observer");
    }

    /// Bridge to async consumers (e.g. a websocket transport).
    ///
    /// Slow receivers lag and lose events instead of blocking workers.
    pub fn subscribe(&self, capacity: usize) -> broadcast::Receiver<RelayedEvent> {
        let (tx, rx) = broadcast::channel(capacity.max(1));
        self.register(move |event| {
            // No receivers left is fine; the subscriber went away.
            let _ = tx.send(event.clone());
        });
        rx
    }

    /// Deliver `event` to every handler, in registration order.
    pub fn dispatch(&self, event: &RelayedEvent) {
        let snapshot: Vec<EventHandler> = {
            let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
            handlers.clone()
        };

        for handler in snapshot.iter() {
            handler(event);
        }
    }

    pub fn len(&self) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every handler.
    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }
}
