//! # Transport abstraction.
//!
//! The subscriber talks to the validator through a [`Connection`]: a
//! bidirectional, message-oriented link that tags outbound frames with a
//! correlation id and delivers inbound frames tagged with a [`MessageType`]
//! and the id of the peer that sent them.
//!
//! ## Provided implementations
//! - [`memory`]: in-process pair, for tests and embedding;
//! - [`tcp`]: length-prefixed frames over a TCP stream.
//!
//! ## Contract
//! - `send` may be called while another task is blocked in `receive`.
//! - `close` is synchronous and idempotent; once closed, a pending or later
//!   `receive` returns [`TransportError::Closed`], and so does `send`.

pub mod memory;
pub mod tcp;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::message::MessageType;

/// Shared handle to a connection.
pub type ConnectionRef = Arc<dyn Connection>;

/// Inbound frame as delivered by [`Connection::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Id of the remote endpoint that delivered the frame.
    pub peer_id: String,
    pub message_type: MessageType,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(peer_id: impl Into<String>, message_type: MessageType, payload: Vec<u8>) -> Self {
        Self {
            peer_id: peer_id.into(),
            message_type,
            payload,
        }
    }
}

/// Message-oriented connection to an event source.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Sends one frame and returns its correlation id.
    async fn send(
        &self,
        message_type: MessageType,
        payload: Vec<u8>,
    ) -> Result<String, TransportError>;

    /// Blocks until the next inbound frame arrives.
    async fn receive(&self) -> Result<Frame, TransportError>;

    /// Closes the connection. Idempotent.
    fn close(&self);
}

/// Generates a random 128-bit correlation id rendered as lowercase hex.
pub(crate) fn new_correlation_id() -> String {
    format!("{:032x}", rand::random::<u128>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correlation_ids_are_hex_and_distinct() {
        let a = new_correlation_id();
        let b = new_correlation_id();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
