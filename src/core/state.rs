//! # Subscriber lifecycle state.
//!
//! ```text
//! Created ──start──► Running ──interrupt──► Unsubscribing ──ack | timeout──► Closed
//!    │                                                                         ▲
//!    └──────────────── subscribe send failed / close() ────────────────────────┘
//! ```
//!
//! Transitions only move forward; `Closed` is terminal.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a [`Subscriber`](crate::Subscriber).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum State {
    /// Registration is open; nothing has been sent.
    Created,
    /// Receive loop running, subscribe request sent.
    Running,
    /// Unsubscribe request sent, waiting for the acknowledgment or timeout.
    Unsubscribing,
    /// Connection closed, signals released.
    Closed,
}

impl State {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => State::Created,
            1 => State::Running,
            2 => State::Unsubscribing,
            _ => State::Closed,
        }
    }

    pub fn as_label(self) -> &'static str {
        match self {
            State::Created => "created",
            State::Running => "running",
            State::Unsubscribing => "unsubscribing",
            State::Closed => "closed",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Atomic holder of a [`State`].
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(State::Created as u8))
    }

    pub(crate) fn get(&self) -> State {
        State::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves `from → to`; returns `false` if the current state is not `from`.
    pub(crate) fn advance(&self, from: State, to: State) -> bool {
        debug_assert!(from < to);
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Forces the terminal state; returns the previous one.
    pub(crate) fn close(&self) -> State {
        State::from_u8(self.0.swap(State::Closed as u8, Ordering::AcqRel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), State::Created);
        assert!(cell.advance(State::Created, State::Running));
        assert!(!cell.advance(State::Created, State::Running));
        assert!(cell.advance(State::Running, State::Unsubscribing));
        assert_eq!(cell.close(), State::Unsubscribing);
        assert_eq!(cell.get(), State::Closed);
        assert!(!cell.advance(State::Running, State::Unsubscribing));
    }
}
