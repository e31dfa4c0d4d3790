//! Runtime core: registration, routing and lifecycle.
//!
//! The only public entry points are [`Subscriber`] and [`SubscriberBuilder`];
//! everything else is wiring behind them.
//!
//! Internal modules:
//! - [`registry`]: subscriptions and handler chains, frozen at start;
//! - [`router`]: decodes inbound frames and runs handler chains;
//! - [`receiver`]: the receive loop feeding the router;
//! - [`signal`]: single-fire unsubscribe acknowledgment;
//! - [`subscriber`]: the lifecycle controller;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod builder;
mod config;
mod hooks;
mod receiver;
mod registry;
mod router;
mod shutdown;
mod signal;
mod state;
mod subscriber;

pub use builder::SubscriberBuilder;
pub use config::Config;
pub use hooks::{OnClose, OnSubscribed, OnUnsubscribed};
pub use state::State;
pub use subscriber::Subscriber;
