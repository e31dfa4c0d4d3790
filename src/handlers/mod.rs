//! # Event handler abstractions.
//!
//! This module provides the handler-related types:
//! - [`Handler`] - trait invoked for every event of a subscribed type
//! - [`HandlerFn`] - closure-backed handler implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler>`)
//! - [`IntoHandlerResult`] - lets closures return either `bool` or `Result<bool, HandlerError>`

mod handler;
mod handler_fn;

pub use handler::{Handler, HandlerRef};
pub use handler_fn::{HandlerFn, IntoHandlerResult};
