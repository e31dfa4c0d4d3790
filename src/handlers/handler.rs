//! # Handler abstraction.
//!
//! A [`Handler`] is one link of an event type's handler chain. Chains run
//! synchronously on the receive loop, in registration order:
//!
//! - `Ok(true)`: continue with the next handler;
//! - `Ok(false)`: stop the chain for this event;
//! - `Err(_)`: logged with event type and index, the chain continues.
//!
//! Panics are caught by the router as well, but returning an error is the
//! expected way to report a failure.

use std::sync::Arc;

use crate::error::HandlerError;
use crate::message::Event;

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;

/// # Synchronous event handler.
///
/// # Example
/// ```
/// use sawtk_subscriber::{Handler, HandlerError};
/// use sawtk_subscriber::message::Event;
///
/// struct BlockPrinter;
///
/// impl Handler for BlockPrinter {
///     fn name(&self) -> &str { "block-printer" }
///
///     fn handle(&self, peer_id: &str, event: &Event) -> Result<bool, HandlerError> {
///         let (_, num) = event
///             .attr("block_num")
///             .ok_or_else(|| HandlerError::failed("missing block_num"))?;
///         println!("{peer_id}: block {num}");
///         Ok(true)
///     }
/// }
/// ```
pub trait Handler: Send + Sync + 'static {
    /// Returns a human-readable handler name (for logs).
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Processes one event delivered by `peer_id`.
    fn handle(&self, peer_id: &str, event: &Event) -> Result<bool, HandlerError>;
}
