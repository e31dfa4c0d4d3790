//! # In-process transport.
//!
//! [`pair`] returns a [`MemoryConnection`] for the subscriber and a
//! [`RemotePeer`] that plays the validator: it sees every frame the
//! subscriber sends and can inject inbound frames.
//!
//! ## Example
//! ```rust
//! use sawtk_subscriber::message::MessageType;
//! use sawtk_subscriber::transport::{Connection, memory};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let (conn, mut peer) = memory::pair("validator-0");
//!
//! let id = conn.send(MessageType::SubscribeRequest, b"{}".to_vec()).await.unwrap();
//! let sent = peer.next_sent().await.unwrap();
//! assert_eq!(sent.correlation_id, id);
//!
//! peer.push(MessageType::EventBatch, b"{\"events\":[]}".to_vec());
//! let frame = conn.receive().await.unwrap();
//! assert_eq!(frame.peer_id, "validator-0");
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

use super::{Connection, Frame, new_correlation_id};
use crate::error::TransportError;
use crate::message::MessageType;

/// Frame sent by the subscriber, as observed by the [`RemotePeer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentFrame {
    pub message_type: MessageType,
    pub correlation_id: String,
    pub payload: Vec<u8>,
}

/// Subscriber side of an in-process pair.
pub struct MemoryConnection {
    outbound: mpsc::UnboundedSender<SentFrame>,
    inbound: Mutex<mpsc::UnboundedReceiver<Frame>>,
    reject_sends: Arc<AtomicBool>,
    closed: CancellationToken,
}

/// Validator side of an in-process pair.
pub struct RemotePeer {
    peer_id: String,
    inbound: mpsc::UnboundedSender<Frame>,
    outbound: mpsc::UnboundedReceiver<SentFrame>,
    reject_sends: Arc<AtomicBool>,
    closed: CancellationToken,
}

/// Creates a connected pair; frames pushed by the peer carry `peer_id`.
pub fn pair(peer_id: impl Into<String>) -> (Arc<MemoryConnection>, RemotePeer) {
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let (in_tx, in_rx) = mpsc::unbounded_channel();
    let reject_sends = Arc::new(AtomicBool::new(false));
    let closed = CancellationToken::new();

    let conn = Arc::new(MemoryConnection {
        outbound: out_tx,
        inbound: Mutex::new(in_rx),
        reject_sends: Arc::clone(&reject_sends),
        closed: closed.clone(),
    });
    let peer = RemotePeer {
        peer_id: peer_id.into(),
        inbound: in_tx,
        outbound: out_rx,
        reject_sends,
        closed,
    };
    (conn, peer)
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn send(
        &self,
        message_type: MessageType,
        payload: Vec<u8>,
    ) -> Result<String, TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        if self.reject_sends.load(Ordering::Acquire) {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "peer rejects sends",
            )));
        }
        let correlation_id = new_correlation_id();
        self.outbound
            .send(SentFrame {
                message_type,
                correlation_id: correlation_id.clone(),
                payload,
            })
            .map_err(|_| TransportError::Closed)?;
        Ok(correlation_id)
    }

    async fn receive(&self) -> Result<Frame, TransportError> {
        let mut rx = self.inbound.lock().await;
        tokio::select! {
            _ = self.closed.cancelled() => Err(TransportError::Closed),
            frame = rx.recv() => frame.ok_or(TransportError::Closed),
        }
    }

    fn close(&self) {
        self.closed.cancel();
    }
}

impl RemotePeer {
    /// Injects an inbound frame. Returns `false` if the connection side is gone.
    pub fn push(&self, message_type: MessageType, payload: Vec<u8>) -> bool {
        self.inbound
            .send(Frame::new(self.peer_id.clone(), message_type, payload))
            .is_ok()
    }

    /// Waits for the next frame sent by the subscriber.
    pub async fn next_sent(&mut self) -> Option<SentFrame> {
        self.outbound.recv().await
    }

    /// Returns an already sent frame without waiting.
    pub fn try_next_sent(&mut self) -> Option<SentFrame> {
        self.outbound.try_recv().ok()
    }

    /// Makes every following `send` on the connection fail with an I/O error.
    pub fn reject_sends(&self, reject: bool) {
        self.reject_sends.store(reject, Ordering::Release);
    }

    /// True once the connection side called `close`.
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// Resolves when the connection side calls `close`.
    pub async fn closed(&self) {
        self.closed.cancelled().await
    }

    /// Drops the inbound side; the connection's `receive` then fails with `Closed`.
    pub fn disconnect(self) {
        drop(self.inbound);
    }
}
