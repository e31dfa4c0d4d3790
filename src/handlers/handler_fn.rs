//! # Function-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a closure `F: Fn(&str, &Event) -> R` where `R` is either
//! `bool` or `Result<bool, HandlerError>`. Shared state goes through `Arc<...>`
//! captured by the closure.
//!
//! ## Example
//! ```rust
//! use sawtk_subscriber::{Handler, HandlerError, HandlerFn, HandlerRef};
//! use sawtk_subscriber::message::Event;
//!
//! let log: HandlerRef = HandlerFn::arc("log", |peer: &str, ev: &Event| {
//!     println!("{peer} {}", ev.event_type);
//!     true
//! });
//!
//! let strict: HandlerRef = HandlerFn::arc("strict", |_: &str, ev: &Event| {
//!     if ev.data.is_empty() {
//!         return Err(HandlerError::failed("empty payload"));
//!     }
//!     Ok(true)
//! });
//!
//! assert_eq!(log.name(), "log");
//! assert_eq!(log.handle("p", &Event::new("t")), Ok(true));
//! assert!(strict.handle("p", &Event::new("t")).is_err());
//! ```

use std::borrow::Cow;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::handlers::handler::Handler;
use crate::message::Event;

/// Conversion of a closure's return value into a handler result.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> Result<bool, HandlerError>;
}

impl IntoHandlerResult for bool {
    #[inline]
    fn into_handler_result(self) -> Result<bool, HandlerError> {
        Ok(self)
    }
}

impl IntoHandlerResult for Result<bool, HandlerError> {
    #[inline]
    fn into_handler_result(self) -> Result<bool, HandlerError> {
        self
    }
}

/// Function-backed handler implementation.
#[derive(Debug)]
pub struct HandlerFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> HandlerFn<F> {
    /// Creates a new function-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new<R>(name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        F: Fn(&str, &Event) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc<R>(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self>
    where
        F: Fn(&str, &Event) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Arc::new(Self::new(name, f))
    }
}

impl<F, R> Handler for HandlerFn<F>
where
    F: Fn(&str, &Event) -> R + Send + Sync + 'static,
    R: IntoHandlerResult,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, peer_id: &str, event: &Event) -> Result<bool, HandlerError> {
        (self.f)(peer_id, event).into_handler_result()
    }
}
