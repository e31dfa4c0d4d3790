//! Runtime events: types and broadcast bus.
//!
//! This module groups the runtime notification **data model** and the **bus**
//! used to publish them. Runtime events describe what the subscriber itself is
//! doing (handshake progress, routing outcomes, shutdown); they are distinct
//! from the validator [`Event`](crate::message::Event)s delivered to handlers.
//!
//! ## Contents
//! - [`RuntimeEventKind`], [`RuntimeEvent`] event classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: lifecycle controller, receive loop, router, observer workers
//!   (overflow/panic).
//! - **Consumers**: the observer listener (fans out to `ObserverSet`) and any
//!   receiver obtained through [`Subscriber::events`](crate::Subscriber::events).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{RuntimeEvent, RuntimeEventKind};
