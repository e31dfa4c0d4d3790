//! # Subscriber configuration.
//!
//! Provides [`Config`], centralized settings for one subscriber run.
//!
//! ## Sentinel values
//! - `wait = 0s` → the unsubscribe wait expires at once; it still races an
//!   acknowledgment that is already in
//! - `bus_capacity = 0` → clamped to 1

use std::time::Duration;

use crate::transport::tcp::DEFAULT_MAX_FRAME_LEN;

/// Configuration for a subscriber run.
///
/// ## Field semantics
/// - `endpoint`: validator address used by [`SubscriberBuilder::connect`](crate::SubscriberBuilder::connect)
/// - `wait`: maximum time to wait for the unsubscribe acknowledgment on shutdown
/// - `bus_capacity`: runtime event bus ring buffer size (min 1)
/// - `max_frame_len`: largest frame accepted by the TCP transport
///
/// ## Notes
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks (`0`) across the codebase.
#[derive(Clone, Debug)]
pub struct Config {
    /// Validator endpoint, `tcp://host:port` or `host:port`.
    pub endpoint: String,

    /// Maximum time to wait for the unsubscribe acknowledgment.
    ///
    /// When the interrupt fires:
    /// - the unsubscribe request is sent
    /// - the controller races the acknowledgment against this duration
    /// - whichever comes first ends the wait; a timeout is logged, not returned
    pub wait: Duration,

    /// Capacity of the runtime event bus.
    ///
    /// Receivers lagging more than `bus_capacity` events skip older items.
    pub bus_capacity: usize,

    /// Largest frame, in bytes, accepted or produced by the TCP transport.
    pub max_frame_len: usize,
}

impl Config {
    /// Creates a default configuration pointing at `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `endpoint = tcp://127.0.0.1:4004` (validator component port)
    /// - `wait = 10s`
    /// - `bus_capacity = 1024`
    /// - `max_frame_len = 16 MiB`
    fn default() -> Self {
        Self {
            endpoint: "tcp://127.0.0.1:4004".to_string(),
            wait: Duration::from_secs(10),
            bus_capacity: 1024,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bus_capacity_clamped() {
        let mut cfg = Config::new("tcp://validator:4004");
        assert_eq!(cfg.endpoint, "tcp://validator:4004");
        assert_eq!(cfg.wait, Duration::from_secs(10));
        cfg.bus_capacity = 0;
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
