//! # sawtk-subscriber
//!
//! **sawtk-subscriber** is an event subscription client for Sawtooth-style
//! validators. It declares subscriptions, receives event batches, routes each
//! event through an ordered chain of handlers, and performs a bounded
//! unsubscribe handshake on shutdown.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   subscribe(event_type, handler, filters)     handle_func(event_type, handler)
//!                   │                                       │
//!                   ▼                                       ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Subscriber (lifecycle controller)                                │
//! │  - Registry (subscriptions + handler chains, frozen at start)     │
//! │  - AckSignal (single-fire unsubscribe acknowledgment)             │
//! │  - Bus (broadcast runtime events)                                 │
//! └──────┬─────────────────────────────────────────────────────┬──────┘
//!        │ start(markers)                                      │ shutdown()
//!        ▼                                                     ▼
//! ┌──────────────┐  Frame   ┌──────────────┐          SubscribeRequest
//! │ receive loop │ ───────► │    Router    │          UnsubscribeRequest
//! └──────▲───────┘          └──────┬───────┘                   │
//!        │                         │ EventBatch                │
//!        │                         ▼                           ▼
//!        │                 h1 ─► h2 ─► h3 (stop on false)  Connection
//!        └──────────────────────── Connection ◄────────────────┘
//!
//! Bus ──► observer listener ──► ObserverSet ──► [queue O1] [queue O2] ...
//! ```
//!
//! ### Lifecycle
//! ```text
//! Created ──start──► Running ──interrupt──► Unsubscribing ──ack | wait elapsed──► Closed
//!    │                                                                          ▲
//!    └───────────── subscribe send failed / close() ────────────────────────────┘
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                        |
//! |-------------------|--------------------------------------------------------------|-------------------------------------------|
//! | **Handlers**      | Ordered per-type chains; `false` stops the chain.            | [`Handler`], [`HandlerFn`]                |
//! | **Lifecycle**     | Subscribe, run until interrupted, unsubscribe with a bound.  | [`Subscriber`], [`SubscriberBuilder`]     |
//! | **Observability** | Runtime events on a broadcast bus, pluggable observers.      | [`RuntimeEvent`], [`Observe`]             |
//! | **Transport**     | In-memory pair and length-prefixed TCP.                      | [`transport::Connection`]                 |
//! | **Errors**        | Typed errors for transport, codec, handlers and lifecycle.   | [`SubscriberError`], [`TransportError`]   |
//! | **Configuration** | Endpoint, unsubscribe wait, bus capacity, frame limit.       | [`Config`]                                |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use sawtk_subscriber::{Config, HandlerFn, Subscriber};
//! use sawtk_subscriber::message::{BLOCK_COMMIT, Event, EventFilter};
//! use sawtk_subscriber::transport::memory;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.wait = Duration::from_millis(50);
//!
//!     let (conn, _validator) = memory::pair("validator-0");
//!     let sub = Subscriber::builder(cfg)
//!         .on_close(|| println!("closed"))
//!         .build(conn);
//!
//!     sub.subscribe(
//!         BLOCK_COMMIT,
//!         HandlerFn::arc("print", |peer: &str, ev: &Event| {
//!             if let Some((_, num)) = ev.attr("block_num") {
//!                 println!("{peer}: block {num}");
//!             }
//!             true
//!         }),
//!         vec![EventFilter::simple_any("block_num", "1")],
//!     )?;
//!
//!     // Interrupt immediately; without an acknowledgment the wait elapses.
//!     let interrupt = CancellationToken::new();
//!     interrupt.cancel();
//!     sub.run_until(Vec::new(), interrupt).await?;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod handlers;
pub mod message;
mod observers;
pub mod transport;

// ---- Public re-exports ----

pub use crate::core::{Config, OnClose, OnSubscribed, OnUnsubscribed, State, Subscriber, SubscriberBuilder};
pub use error::{CodecError, HandlerError, SubscriberError, TransportError};
pub use events::{Bus, RuntimeEvent, RuntimeEventKind};
pub use handlers::{Handler, HandlerFn, HandlerRef, IntoHandlerResult};
pub use observers::{Observe, ObserverSet};

// Optional: expose a simple built-in logger observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
