//! Error types used by the subscriber runtime, its transports and handlers.
//!
//! This module defines four error enums:
//!
//! - [`SubscriberError`]: errors surfaced to the caller of the lifecycle API.
//! - [`TransportError`]: failures of the underlying connection.
//! - [`CodecError`]: payload encoding/decoding failures.
//! - [`HandlerError`]: failures reported by event handlers.
//!
//! Each type provides `as_label` (a short stable snake_case label) for logs/metrics.

use thiserror::Error;

/// # Errors surfaced by the subscriber lifecycle API.
///
/// Once [`Subscriber::start`](crate::Subscriber::start) has succeeded nothing
/// is returned upstream anymore; later failures are logged and published as
/// [`RuntimeEvent`](crate::RuntimeEvent)s.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubscriberError {
    /// Registration or a second start was attempted after `start` had begun.
    #[error("subscriber already started")]
    AlreadyStarted,

    /// Shutdown was requested on a subscriber that is not running.
    #[error("subscriber is not running")]
    NotRunning,

    /// Connecting or sending over the transport failed.
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    /// Encoding a request failed.
    #[error("codec: {0}")]
    Codec(#[from] CodecError),
}

impl SubscriberError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use sawtk_subscriber::SubscriberError;
    ///
    /// assert_eq!(SubscriberError::AlreadyStarted.as_label(), "subscriber_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubscriberError::AlreadyStarted => "subscriber_already_started",
            SubscriberError::NotRunning => "subscriber_not_running",
            SubscriberError::Transport(e) => e.as_label(),
            SubscriberError::Codec(_) => "codec_error",
        }
    }
}

/// # Errors produced by a [`Connection`](crate::transport::Connection).
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum TransportError {
    /// The endpoint string could not be parsed.
    #[error("invalid endpoint {0:?}")]
    InvalidEndpoint(String),

    /// Connecting to the endpoint failed.
    #[error("connect to {endpoint} failed: {source}")]
    Connect {
        /// Endpoint as configured.
        endpoint: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Reading or writing the socket failed.
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),

    /// A frame exceeded the configured maximum length.
    #[error("frame exceeds limit of {max} bytes")]
    FrameTooLarge {
        /// Configured limit.
        max: usize,
    },

    /// The connection was closed locally or by the peer.
    #[error("connection closed")]
    Closed,

    /// A frame envelope could not be encoded or decoded.
    #[error("envelope: {0}")]
    Codec(#[from] CodecError),
}

impl TransportError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            TransportError::InvalidEndpoint(_) => "transport_invalid_endpoint",
            TransportError::Connect { .. } => "transport_connect",
            TransportError::Io(_) => "transport_io",
            TransportError::FrameTooLarge { .. } => "transport_frame_too_large",
            TransportError::Closed => "transport_closed",
            TransportError::Codec(_) => "transport_codec",
        }
    }

    /// True if the error means the connection is gone for good.
    pub fn is_closed(&self) -> bool {
        match self {
            TransportError::Closed => true,
            TransportError::Io(e) => e.kind() == std::io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }
}

/// # Payload encoding/decoding failure.
#[derive(Error, Debug)]
#[error("{what}: {source}")]
pub struct CodecError {
    /// Which message was being encoded/decoded (e.g. `"event list"`).
    pub what: &'static str,
    /// Underlying serializer error.
    #[source]
    pub source: serde_json::Error,
}

/// # Errors reported by event handlers.
///
/// Returned instead of panicking; the router logs it with the event type and
/// handler index and moves on to the next handler in the chain.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// The handler could not process the event.
    #[error("handler failed: {reason}")]
    Failed {
        /// Human-readable reason.
        reason: String,
    },
}

impl HandlerError {
    /// Convenience constructor for [`HandlerError::Failed`].
    ///
    /// # Example
    /// ```
    /// use sawtk_subscriber::HandlerError;
    ///
    /// let err = HandlerError::failed("bad attribute");
    /// assert_eq!(err.as_label(), "handler_failed");
    /// assert_eq!(err.to_string(), "handler failed: bad attribute");
    /// ```
    pub fn failed(reason: impl Into<String>) -> Self {
        HandlerError::Failed {
            reason: reason.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Failed { .. } => "handler_failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_labels() {
        assert_eq!(TransportError::Closed.as_label(), "transport_closed");
        let err = TransportError::FrameTooLarge { max: 4 };
        assert_eq!(err.to_string(), "frame exceeds limit of 4 bytes");
    }

    #[test]
    fn test_subscriber_error_wraps_transport() {
        let err: SubscriberError = TransportError::Closed.into();
        assert_eq!(err.as_label(), "transport_closed");
        assert_eq!(err.to_string(), "transport: connection closed");
    }

    #[test]
    fn test_closed_detection() {
        assert!(TransportError::Closed.is_closed());
        let eof = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(TransportError::Io(eof).is_closed());
        assert!(!TransportError::InvalidEndpoint("x".into()).is_closed());
    }
}
