//! Single-consumer event dispatch loop and handler registry
//!
//! Events are delivered in enqueue order, one at a time. For each event all
//! handlers registered for its kind run sequentially in registration order.
//! Delivery is at-most-once and best-effort: a failing handler is logged and
//! isolated, never retried, and never aborts the loop.

use super::bus::EventReceiver;
use crate::domain::{DomainEvent, EventKind};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// An asynchronous domain event handler.
///
/// Handlers needing guaranteed delivery must be idempotent and build their
/// own outbox/retry on top.
#[async_trait]
pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;
    async fn handle(&self, event: &DomainEvent) -> Result<()>;
}

/// Explicit mapping from event kind to an ordered list of handlers.
///
/// Populated once at startup; looked up by kind at dispatch time.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<EventKind, Vec<Arc<dyn EventHandler>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EventKind, handler: Arc<dyn EventHandler>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    pub fn handlers_for(&self, kind: EventKind) -> &[Arc<dyn EventHandler>] {
        self.handlers.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

/// Single long-lived background consumer of the domain event queue.
pub struct EventDispatcher {
    receiver: EventReceiver,
    registry: Arc<HandlerRegistry>,
}

impl EventDispatcher {
    pub fn new(receiver: EventReceiver, registry: Arc<HandlerRegistry>) -> Self {
        Self { receiver, registry }
    }

    /// Spawn the drain loop. It terminates cooperatively when the shutdown
    /// signal flips to true or when all producer handles are dropped.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!("Event dispatcher started");

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    // A dropped shutdown owner counts as shutdown.
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                event = self.receiver.recv() => {
                    match event {
                        Some(event) => self.dispatch(event, &shutdown).await,
                        None => break,
                    }
                }
            }
        }

        info!("Event dispatcher stopped");
    }

    /// Deliver one event to every registered handler, in registration order.
    ///
    /// A pending shutdown stops before the next handler; the in-flight
    /// handler always runs to completion.
    async fn dispatch(&self, event: DomainEvent, shutdown: &watch::Receiver<bool>) {
        let kind = event.kind();
        let handlers = self.registry.handlers_for(kind);
        if handlers.is_empty() {
            debug!(event = %kind, "No handlers registered, dropping event");
            return;
        }

        for handler in handlers {
            if *shutdown.borrow() {
                info!(event = %kind, "Shutdown pending, skipping remaining handlers");
                return;
            }
            if let Err(e) = handler.handle(&event).await {
                error!(
                    event = %kind,
                    handler = handler.name(),
                    error = %e,
                    "Event handler failed"
                );
            }
        }
    }
}
