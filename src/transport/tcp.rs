//! # TCP transport.
//!
//! Frames are length-prefixed ([`LengthDelimitedCodec`]: a 4-byte big-endian
//! length) and carry a JSON envelope `{message_type, correlation_id, content}`.
//! `content` is the JSON payload embedded as is. The peer id of every inbound
//! frame is the remote socket address.
//!
//! ## Endpoints
//! Both `tcp://host:port` (validator style) and bare `host:port` are accepted.
//!
//! ## Close
//! [`Connection::close`] drops both socket halves, so the peer reads EOF. A
//! `send` or `receive` in flight at that moment releases its half itself and
//! returns [`TransportError::Closed`].

use async_trait::async_trait;
use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec, LengthDelimitedCodecError};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{Connection, Frame, new_correlation_id};
use crate::error::TransportError;
use crate::message::{MessageType, codec};

/// Default upper bound for a single frame (16 MiB).
pub const DEFAULT_MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

type Reader = FramedRead<OwnedReadHalf, LengthDelimitedCodec>;
type Writer = FramedWrite<OwnedWriteHalf, LengthDelimitedCodec>;

/// Wire envelope of one frame.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Envelope {
    pub message_type: u32,
    pub correlation_id: String,
    pub content: Box<RawValue>,
}

/// Connection to a validator over TCP.
pub struct TcpConnection {
    peer: String,
    reader: Mutex<Option<Reader>>,
    writer: Mutex<Option<Writer>>,
    max_frame_len: usize,
    closed: CancellationToken,
}

impl TcpConnection {
    /// Connects to `endpoint` with the default frame limit.
    pub async fn connect(endpoint: &str) -> Result<Self, TransportError> {
        Self::connect_with_limit(endpoint, DEFAULT_MAX_FRAME_LEN).await
    }

    /// Connects to `endpoint`; frames longer than `max_frame_len` are rejected.
    pub async fn connect_with_limit(
        endpoint: &str,
        max_frame_len: usize,
    ) -> Result<Self, TransportError> {
        let addr = parse_endpoint(endpoint)?;
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| TransportError::Connect {
                endpoint: endpoint.to_string(),
                source,
            })?;
        stream.set_nodelay(true)?;
        Ok(Self::from_stream(stream, max_frame_len))
    }

    /// Wraps an already connected stream.
    pub fn from_stream(stream: TcpStream, max_frame_len: usize) -> Self {
        let peer = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());
        let max_frame_len = max_frame_len.max(1);
        let framing = LengthDelimitedCodec::builder()
            .length_field_length(4)
            .big_endian()
            .max_frame_length(max_frame_len)
            .clone();
        let (reader, writer) = stream.into_split();
        debug!(peer = %peer, "tcp connection established");
        Self {
            peer,
            reader: Mutex::new(Some(framing.new_read(reader))),
            writer: Mutex::new(Some(framing.new_write(writer))),
            max_frame_len,
            closed: CancellationToken::new(),
        }
    }

    /// Remote socket address.
    pub fn peer(&self) -> &str {
        &self.peer
    }

    fn frame_error(&self, err: std::io::Error) -> TransportError {
        let too_large = err
            .get_ref()
            .is_some_and(|inner| inner.is::<LengthDelimitedCodecError>());
        if too_large {
            TransportError::FrameTooLarge {
                max: self.max_frame_len,
            }
        } else {
            TransportError::Io(err)
        }
    }
}

#[async_trait]
impl Connection for TcpConnection {
    async fn send(
        &self,
        message_type: MessageType,
        payload: Vec<u8>,
    ) -> Result<String, TransportError> {
        if self.closed.is_cancelled() {
            return Err(TransportError::Closed);
        }
        let correlation_id = new_correlation_id();
        let envelope = Envelope {
            message_type: message_type.code(),
            correlation_id: correlation_id.clone(),
            content: codec::decode("payload", &payload)?,
        };
        let bytes = Bytes::from(codec::encode("envelope", &envelope)?);

        let mut guard = self.writer.lock().await;
        let Some(writer) = guard.as_mut() else {
            return Err(TransportError::Closed);
        };
        let sent = tokio::select! {
            _ = self.closed.cancelled() => None,
            res = writer.send(bytes) => Some(res),
        };
        match sent {
            Some(res) => res.map_err(|e| self.frame_error(e))?,
            None => {
                guard.take();
                return Err(TransportError::Closed);
            }
        }
        Ok(correlation_id)
    }

    async fn receive(&self) -> Result<Frame, TransportError> {
        let mut guard = self.reader.lock().await;
        let Some(reader) = guard.as_mut() else {
            return Err(TransportError::Closed);
        };
        let next = tokio::select! {
            _ = self.closed.cancelled() => None,
            next = reader.next() => Some(next),
        };
        let bytes = match next {
            Some(Some(res)) => res.map_err(|e| self.frame_error(e))?,
            Some(None) => return Err(TransportError::Closed),
            None => {
                guard.take();
                return Err(TransportError::Closed);
            }
        };

        let envelope: Envelope = codec::decode("envelope", &bytes)?;
        Ok(Frame::new(
            self.peer.clone(),
            MessageType::from(envelope.message_type),
            envelope.content.get().as_bytes().to_vec(),
        ))
    }

    fn close(&self) {
        self.closed.cancel();
        // Halves held by an in-flight call are dropped by that call.
        if let Ok(mut writer) = self.writer.try_lock() {
            writer.take();
        }
        if let Ok(mut reader) = self.reader.try_lock() {
            reader.take();
        }
    }
}

/// Strips an optional `tcp://` scheme and validates `host:port`.
pub(crate) fn parse_endpoint(endpoint: &str) -> Result<&str, TransportError> {
    let addr = endpoint.strip_prefix("tcp://").unwrap_or(endpoint);
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(addr),
        _ => Err(TransportError::InvalidEndpoint(endpoint.to_string())),
    }
}
