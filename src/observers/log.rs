//! # LogWriter: runtime event renderer
//!
//! A minimal observer that renders incoming [`RuntimeEvent`]s through `tracing`
//! under the `sawtk_subscriber::events` target. Use it for demos or when no
//! dedicated metrics sink is wired.
//!
//! ## Example output
//! ```text
//! [subscribe-sent] correlation_id="5f0c..."
//! [subscribed] peer="10.0.0.2:4004"
//! [handler-stopped] event_type="sawtooth/block-commit" index=1
//! [shutdown-requested]
//! [unsubscribe-timed-out] reason="200ms"
//! [closed]
//! ```

use async_trait::async_trait;
use tracing::info;

use crate::events::{RuntimeEvent, RuntimeEventKind};
use crate::observers::Observe;

/// Event writer observer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, e: &RuntimeEvent) {
        let tag = match e.kind {
            RuntimeEventKind::SubscribeSent => "subscribe-sent",
            RuntimeEventKind::Subscribed => "subscribed",
            RuntimeEventKind::Unsubscribed => "unsubscribed",
            RuntimeEventKind::EventDelivered => "event-delivered",
            RuntimeEventKind::NoHandler => "no-handler",
            RuntimeEventKind::HandlerStopped => "handler-stopped",
            RuntimeEventKind::HandlerFailed => "handler-failed",
            RuntimeEventKind::HandlerPanicked => "handler-panicked",
            RuntimeEventKind::DecodeFailed => "decode-failed",
            RuntimeEventKind::UnknownMessage => "unknown-message",
            RuntimeEventKind::ReceiveLoopStopped => "receive-loop-stopped",
            RuntimeEventKind::ShutdownRequested => "shutdown-requested",
            RuntimeEventKind::UnsubscribeAcked => "unsubscribe-acked",
            RuntimeEventKind::UnsubscribeTimedOut => "unsubscribe-timed-out",
            RuntimeEventKind::Closed => "closed",
            RuntimeEventKind::ObserverPanicked => "observer-panicked",
            RuntimeEventKind::ObserverOverflow => "observer-overflow",
        };
        info!(
            target: "sawtk_subscriber::events",
            seq = e.seq,
            peer = ?e.peer,
            event_type = ?e.event_type,
            index = ?e.index,
            message_type = ?e.message_type,
            correlation_id = ?e.correlation_id,
            reason = ?e.reason,
            "[{tag}]"
        );
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
