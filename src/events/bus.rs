//! # Event bus for broadcasting runtime events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`] that provides
//! non-blocking publishing from the receive loop and the lifecycle controller.
//!
//! ## Architecture
//! ```text
//! Publishers:                          Receivers:
//!   Lifecycle controller ──┐
//!   Receive loop ──────────┼──► Bus ───► observer listener ──► ObserverSet
//!   Router ────────────────┘       └───► Subscriber::events() receivers
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` never blocks; routing never waits on observers.
//! - **Bounded capacity**: a single ring buffer stores recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if there are no active receivers at send time.

use tokio::sync::broadcast;

use super::event::RuntimeEvent;

/// Broadcast channel for runtime events.
///
/// ### Properties
/// - **Non-blocking**: `publish()` returns immediately.
/// - **Fire-and-forget**: no delivery or durability guarantees.
/// - **Cloneable**: cheap to clone (internally holds an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<RuntimeEvent>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<RuntimeEvent>(capacity);
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: RuntimeEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    ///
    /// A receiver only gets events **sent after** it subscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<RuntimeEvent> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::RuntimeEventKind;

    #[tokio::test]
    async fn test_receivers_see_only_later_events() {
        let bus = Bus::new(0);
        bus.publish(RuntimeEvent::new(RuntimeEventKind::SubscribeSent));

        let mut rx = bus.subscribe();
        bus.publish(RuntimeEvent::new(RuntimeEventKind::Closed));

        let ev = rx.recv().await.unwrap();
        assert_eq!(ev.kind, RuntimeEventKind::Closed);
        assert!(rx.try_recv().is_err());
    }
}
