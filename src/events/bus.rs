//! Bounded domain event queue
//!
//! One producer-side handle (`EventBus`, cloneable) and one consumer-side
//! receiver, constructed explicitly at startup and owned by the process
//! lifecycle. The queue is capacity-bounded: publishing into a full queue
//! suspends the caller until the consumer drains a slot. Events are never
//! dropped and never rejected while the dispatcher is alive.

use crate::domain::DomainEvent;
use crate::error::{AppError, Result};
use tokio::sync::mpsc;

/// Consumer-side handle, passed to the dispatcher.
pub type EventReceiver = mpsc::Receiver<DomainEvent>;

/// Create the bounded event queue.
pub fn event_queue(capacity: usize) -> (EventBus, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventBus { tx }, rx)
}

/// Producer-side handle to the domain event queue.
#[derive(Clone)]
pub struct EventBus {
    tx: mpsc::Sender<DomainEvent>,
}

impl EventBus {
    /// Enqueue an event, suspending while the queue is at capacity.
    ///
    /// Fails only when the dispatcher has shut down and the receiver is gone.
    pub async fn publish(&self, event: DomainEvent) -> Result<()> {
        let kind = event.kind();
        self.tx.send(event).await.map_err(|_| {
            AppError::Internal(anyhow::anyhow!(
                "event queue closed while publishing '{}'",
                kind
            ))
        })
    }

    /// Enqueue a batch in order, applying backpressure per event.
    pub async fn publish_all(&self, events: Vec<DomainEvent>) -> Result<()> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StringUuid;
    use chrono::Utc;
    use tokio_test::{assert_pending, assert_ready_ok, task};

    fn event() -> DomainEvent {
        DomainEvent::UserDeactivated {
            user_id: StringUuid::new_v4(),
            tenant_id: StringUuid::new_v4(),
            occurred_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_blocks_at_capacity_and_resumes() {
        let (bus, mut rx) = event_queue(1);

        bus.publish(event()).await.unwrap();

        // Second publish must suspend: the queue is full.
        let mut blocked = task::spawn(bus.publish(event()));
        assert_pending!(blocked.poll());

        // Draining one slot wakes the producer without an error or a drop.
        rx.recv().await.unwrap();
        assert!(blocked.is_woken());
        assert_ready_ok!(blocked.poll());

        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_publish_fails_after_receiver_dropped() {
        let (bus, rx) = event_queue(4);
        drop(rx);
        assert!(bus.publish(event()).await.is_err());
    }

    #[tokio::test]
    async fn test_publish_all_preserves_order() {
        let (bus, mut rx) = event_queue(8);
        let first = event();
        let second = event();
        let first_id = first.user_id();
        let second_id = second.user_id();

        bus.publish_all(vec![first, second]).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().user_id(), first_id);
        assert_eq!(rx.recv().await.unwrap().user_id(), second_id);
    }
}
