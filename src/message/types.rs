//! # Frame tags.
//!
//! [`MessageType`] is the tagged variant the router matches on. Known client
//! event tags map to named variants; anything else is kept as [`MessageType::Other`]
//! so the router can log it instead of failing the decode.

use std::fmt;

/// Message-type tag carried by every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// Client → validator: register event subscriptions.
    SubscribeRequest,
    /// Validator → client: result of a subscribe request.
    SubscribeResponse,
    /// Client → validator: drop all subscriptions of this connection.
    UnsubscribeRequest,
    /// Validator → client: result of an unsubscribe request.
    UnsubscribeResponse,
    /// Validator → client: batch of events.
    EventBatch,
    /// Any tag this client does not handle.
    Other(u32),
}

impl MessageType {
    /// Numeric wire code.
    pub const fn code(self) -> u32 {
        match self {
            MessageType::SubscribeRequest => 500,
            MessageType::SubscribeResponse => 501,
            MessageType::UnsubscribeRequest => 502,
            MessageType::UnsubscribeResponse => 503,
            MessageType::EventBatch => 504,
            MessageType::Other(code) => code,
        }
    }

    /// Short stable label for logs.
    pub fn as_label(self) -> &'static str {
        match self {
            MessageType::SubscribeRequest => "client_events_subscribe_request",
            MessageType::SubscribeResponse => "client_events_subscribe_response",
            MessageType::UnsubscribeRequest => "client_events_unsubscribe_request",
            MessageType::UnsubscribeResponse => "client_events_unsubscribe_response",
            MessageType::EventBatch => "client_events",
            MessageType::Other(_) => "other",
        }
    }
}

impl From<u32> for MessageType {
    fn from(code: u32) -> Self {
        match code {
            500 => MessageType::SubscribeRequest,
            501 => MessageType::SubscribeResponse,
            502 => MessageType::UnsubscribeRequest,
            503 => MessageType::UnsubscribeResponse,
            504 => MessageType::EventBatch,
            other => MessageType::Other(other),
        }
    }
}

impl From<MessageType> for u32 {
    fn from(ty: MessageType) -> Self {
        ty.code()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageType::Other(code) => write!(f, "other({code})"),
            known => f.write_str(known.as_label()),
        }
    }
}
