//! # Runtime event observers.
//!
//! This module provides the [`Observe`] trait, the [`ObserverSet`] fan-out and
//! the optional built-in `LogWriter` (feature `logging`).
//!
//! ## Architecture
//! ```text
//! Router / Controller ── publish(RuntimeEvent) ──► Bus ──► observer listener
//!                                                              │
//!                                                              ▼
//!                                                     ObserverSet::emit(&ev)
//!                                                  ┌──────────┼──────────┐
//!                                                  ▼          ▼          ▼
//!                                              [queue O1] [queue O2] [queue ON]
//!                                                  │          │          │
//!                                               on_event   on_event   on_event
//! ```
//!
//! Observer events themselves (overflow, panic) are not fanned out again, so a
//! misbehaving observer cannot feed on its own failures.

#[cfg(feature = "logging")]
mod log;
mod observe;
mod set;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observe::Observe;
pub use set::ObserverSet;

pub(crate) use set::panic_message;
