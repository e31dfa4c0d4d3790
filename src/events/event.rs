//! # Runtime events emitted by the subscriber.
//!
//! The [`RuntimeEventKind`] enum classifies runtime events across four categories:
//! - **Handshake events**: subscribe/unsubscribe progress
//! - **Routing events**: what happened to each inbound frame and event
//! - **Shutdown events**: interrupt, acknowledgment race, teardown
//! - **Observer events**: observer overflow and panics
//!
//! The [`RuntimeEvent`] struct carries additional metadata such as timestamps,
//! peer id, event type and handler index.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use sawtk_subscriber::{RuntimeEvent, RuntimeEventKind};
//!
//! let ev = RuntimeEvent::new(RuntimeEventKind::HandlerStopped)
//!     .with_event_type("sawtooth/block-commit")
//!     .with_peer("validator-0")
//!     .with_index(1);
//!
//! assert_eq!(ev.kind, RuntimeEventKind::HandlerStopped);
//! assert_eq!(ev.event_type.as_deref(), Some("sawtooth/block-commit"));
//! assert_eq!(ev.index, Some(1));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::message::MessageType;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeEventKind {
    // === Handshake events ===
    /// Subscribe request was sent.
    ///
    /// Sets:
    /// - `correlation_id`: id returned by the transport
    SubscribeSent,

    /// Subscribe response received and decoded.
    ///
    /// Sets:
    /// - `peer`: responding peer
    /// - `reason`: status and message when the status is not `OK`
    Subscribed,

    /// Unsubscribe response received and decoded.
    ///
    /// Sets:
    /// - `peer`: responding peer
    /// - `reason`: status when the status is not `OK`
    Unsubscribed,

    // === Routing events ===
    /// An event ran through its whole handler chain.
    ///
    /// Sets:
    /// - `peer`, `event_type`
    EventDelivered,

    /// No handler chain is registered for the event type.
    ///
    /// Sets:
    /// - `peer`, `event_type`
    NoHandler,

    /// A handler returned `false`; the rest of the chain was skipped.
    ///
    /// Sets:
    /// - `peer`, `event_type`
    /// - `index`: position of the handler in its chain
    HandlerStopped,

    /// A handler returned an error.
    ///
    /// Sets:
    /// - `peer`, `event_type`, `index`
    /// - `reason`: error message
    HandlerFailed,

    /// A handler panicked.
    ///
    /// Sets:
    /// - `peer`, `event_type`, `index`
    /// - `reason`: panic message
    HandlerPanicked,

    /// A payload could not be decoded; the frame was skipped.
    ///
    /// Sets:
    /// - `peer`, `message_type`
    /// - `reason`: decoder error
    DecodeFailed,

    /// A frame with an unhandled message type arrived.
    ///
    /// Sets:
    /// - `peer`, `message_type`
    UnknownMessage,

    /// The receive loop exited.
    ///
    /// Sets:
    /// - `reason`: transport error that ended the loop
    ReceiveLoopStopped,

    // === Shutdown events ===
    /// Interrupt observed; the unsubscribe handshake begins.
    ShutdownRequested,

    /// Unsubscribe acknowledgment won the race against the wait timer.
    UnsubscribeAcked,

    /// The wait timer fired before any acknowledgment.
    ///
    /// Sets:
    /// - `reason`: configured wait
    UnsubscribeTimedOut,

    /// Teardown finished; the subscriber is closed.
    Closed,

    // === Observer events ===
    /// Observer panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: observer name and panic info
    ObserverPanicked,

    /// Observer dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: observer name and cause
    ObserverOverflow,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`RuntimeEventKind`]
#[derive(Debug, Clone)]
pub struct RuntimeEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: RuntimeEventKind,

    /// Peer that delivered the frame, if applicable.
    pub peer: Option<Arc<str>>,
    /// Validator event type, if applicable.
    pub event_type: Option<Arc<str>>,
    /// Handler position within its chain.
    pub index: Option<u32>,
    /// Frame message type, if applicable.
    pub message_type: Option<MessageType>,
    /// Correlation id of a sent request.
    pub correlation_id: Option<Arc<str>>,
    /// Human-readable reason (errors, statuses, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl RuntimeEvent {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: RuntimeEventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            peer: None,
            event_type: None,
            index: None,
            message_type: None,
            correlation_id: None,
            reason: None,
        }
    }

    /// Attaches a peer id.
    #[inline]
    pub fn with_peer(mut self, peer: impl Into<Arc<str>>) -> Self {
        self.peer = Some(peer.into());
        self
    }

    /// Attaches a validator event type.
    #[inline]
    pub fn with_event_type(mut self, event_type: impl Into<Arc<str>>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    /// Attaches a handler index.
    #[inline]
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index.min(u32::MAX as usize) as u32);
        self
    }

    /// Attaches a frame message type.
    #[inline]
    pub fn with_message_type(mut self, ty: MessageType) -> Self {
        self.message_type = Some(ty);
        self
    }

    /// Attaches a correlation id.
    #[inline]
    pub fn with_correlation_id(mut self, id: impl Into<Arc<str>>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates an observer overflow event.
    #[inline]
    pub fn observer_overflow(observer: &'static str, reason: &'static str) -> Self {
        RuntimeEvent::new(RuntimeEventKind::ObserverOverflow)
            .with_reason(format!("observer={observer} reason={reason}"))
    }

    /// Creates an observer panic event.
    #[inline]
    pub fn observer_panicked(observer: &'static str, info: String) -> Self {
        RuntimeEvent::new(RuntimeEventKind::ObserverPanicked)
            .with_reason(format!("observer={observer} info={info}"))
    }

    #[inline]
    pub fn is_observer_event(&self) -> bool {
        matches!(
            self.kind,
            RuntimeEventKind::ObserverOverflow | RuntimeEventKind::ObserverPanicked
        )
    }
}
