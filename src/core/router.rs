//! # Message router.
//!
//! Classifies inbound frames by [`MessageType`] and dispatches them.
//!
//! ## Dispatch table
//! ```text
//! SubscribeResponse   ─► decode ─► on_subscribed hook
//! EventBatch          ─► decode ─► for each event (delivery order):
//!                                    chain = handlers[event_type]
//!                                    ├─ none        ─► warn "no handler", skip
//!                                    └─ h0, h1, ... ─► run until one returns false
//! UnsubscribeResponse ─► decode ─► on_unsubscribed hook ─► fire ack signal
//! anything else       ─► warn "unknown message type"
//! ```
//!
//! ## Rules
//! - Decode failures are logged and the frame is skipped; routing goes on.
//! - A handler error or panic is logged with event type and index; the chain
//!   continues with the next handler.
//! - The ack signal fires even if the unsubscribe response fails to decode.
//! - Nothing escapes `route`: a panic anywhere in dispatch is caught here.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::{debug, error, warn};

use super::hooks::{Hooks, guarded};
use super::registry::HandlerMap;
use super::signal::AckSignal;
use crate::error::CodecError;
use crate::events::{Bus, RuntimeEvent, RuntimeEventKind};
use crate::message::{
    Event, EventList, MessageType, SubscribeResponse, UnsubscribeResponse, codec,
};
use crate::observers::panic_message;
use crate::transport::Frame;

/// Immutable dispatch state for one run.
pub(crate) struct Router {
    handlers: HandlerMap,
    hooks: Hooks,
    ack: Arc<AckSignal>,
    bus: Bus,
}

impl Router {
    pub(crate) fn new(handlers: HandlerMap, hooks: Hooks, ack: Arc<AckSignal>, bus: Bus) -> Self {
        Self {
            handlers,
            hooks,
            ack,
            bus,
        }
    }

    /// Routes one inbound frame. Never panics.
    pub(crate) fn route(&self, frame: &Frame) {
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| self.dispatch(frame))) {
            error!(
                peer = %frame.peer_id,
                message_type = %frame.message_type,
                info = %panic_message(panic.as_ref()),
                "routing panicked"
            );
        }
    }

    fn dispatch(&self, frame: &Frame) {
        match frame.message_type {
            MessageType::SubscribeResponse => self.subscribe_response(frame),
            MessageType::EventBatch => self.event_batch(frame),
            MessageType::UnsubscribeResponse => self.unsubscribe_response(frame),
            MessageType::SubscribeRequest
            | MessageType::UnsubscribeRequest
            | MessageType::Other(_) => {
                warn!(
                    peer = %frame.peer_id,
                    message_type = %frame.message_type,
                    "unknown message type"
                );
                self.bus.publish(
                    RuntimeEvent::new(RuntimeEventKind::UnknownMessage)
                        .with_peer(frame.peer_id.as_str())
                        .with_message_type(frame.message_type),
                );
            }
        }
    }

    fn subscribe_response(&self, frame: &Frame) {
        let resp: SubscribeResponse = match codec::decode("subscribe response", &frame.payload) {
            Ok(r) => r,
            Err(e) => return self.decode_failed(frame, &e),
        };

        let mut ev = RuntimeEvent::new(RuntimeEventKind::Subscribed).with_peer(frame.peer_id.as_str());
        if !resp.is_ok() {
            warn!(
                peer = %frame.peer_id,
                status = ?resp.status,
                message = %resp.response_message,
                "subscribe rejected"
            );
            ev = ev.with_reason(format!("{:?}: {}", resp.status, resp.response_message));
        }
        self.bus.publish(ev);

        if let Some(hook) = &self.hooks.on_subscribed {
            guarded("on_subscribed", || hook(frame.peer_id.as_str(), &resp));
        }
    }

    fn event_batch(&self, frame: &Frame) {
        let list: EventList = match codec::decode("event list", &frame.payload) {
            Ok(l) => l,
            Err(e) => return self.decode_failed(frame, &e),
        };
        for event in &list.events {
            self.run_chain(&frame.peer_id, event);
        }
    }

    fn unsubscribe_response(&self, frame: &Frame) {
        match codec::decode::<UnsubscribeResponse>("unsubscribe response", &frame.payload) {
            Ok(resp) => {
                let mut ev = RuntimeEvent::new(RuntimeEventKind::Unsubscribed)
                    .with_peer(frame.peer_id.as_str());
                if !resp.is_ok() {
                    warn!(peer = %frame.peer_id, status = ?resp.status, "unsubscribe failed on peer");
                    ev = ev.with_reason(format!("{:?}", resp.status));
                }
                self.bus.publish(ev);

                if let Some(hook) = &self.hooks.on_unsubscribed {
                    guarded("on_unsubscribed", || hook(frame.peer_id.as_str(), &resp));
                }
            }
            Err(e) => self.decode_failed(frame, &e),
        }

        if !self.ack.fire() {
            debug!(peer = %frame.peer_id, "unsubscribe acknowledgment already signalled");
        }
    }

    /// Runs the handler chain of `event.event_type` in registration order.
    fn run_chain(&self, peer: &str, event: &Event) {
        let Some(chain) = self.handlers.get(&event.event_type) else {
            warn!(peer, event_type = %event.event_type, "no handler");
            self.bus.publish(
                RuntimeEvent::new(RuntimeEventKind::NoHandler)
                    .with_peer(peer)
                    .with_event_type(event.event_type.as_str()),
            );
            return;
        };

        for (index, handler) in chain.iter().enumerate() {
            match catch_unwind(AssertUnwindSafe(|| handler.handle(peer, event))) {
                Ok(Ok(true)) => {}
                Ok(Ok(false)) => {
                    debug!(
                        peer,
                        event_type = %event.event_type,
                        index,
                        handler = handler.name(),
                        "handler stopped chain"
                    );
                    self.bus.publish(
                        RuntimeEvent::new(RuntimeEventKind::HandlerStopped)
                            .with_peer(peer)
                            .with_event_type(event.event_type.as_str())
                            .with_index(index),
                    );
                    return;
                }
                Ok(Err(e)) => {
                    error!(
                        peer,
                        event_type = %event.event_type,
                        index,
                        handler = handler.name(),
                        error = %e,
                        "handler failed"
                    );
                    self.bus.publish(
                        RuntimeEvent::new(RuntimeEventKind::HandlerFailed)
                            .with_peer(peer)
                            .with_event_type(event.event_type.as_str())
                            .with_index(index)
                            .with_reason(e.to_string()),
                    );
                }
                Err(panic) => {
                    let info = panic_message(panic.as_ref());
                    error!(
                        peer,
                        event_type = %event.event_type,
                        index,
                        handler = handler.name(),
                        info = %info,
                        "handler panicked"
                    );
                    self.bus.publish(
                        RuntimeEvent::new(RuntimeEventKind::HandlerPanicked)
                            .with_peer(peer)
                            .with_event_type(event.event_type.as_str())
                            .with_index(index)
                            .with_reason(info),
                    );
                }
            }
        }

        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::EventDelivered)
                .with_peer(peer)
                .with_event_type(event.event_type.as_str()),
        );
    }

    fn decode_failed(&self, frame: &Frame, err: &CodecError) {
        warn!(
            peer = %frame.peer_id,
            message_type = %frame.message_type,
            error = %err,
            "decode failed"
        );
        self.bus.publish(
            RuntimeEvent::new(RuntimeEventKind::DecodeFailed)
                .with_peer(frame.peer_id.as_str())
                .with_message_type(frame.message_type)
                .with_reason(err.to_string()),
        );
    }
}
