//! # Core observer trait
//!
//! `Observe` is the extension point for plugging metrics, alerting or audit
//! sinks into the subscriber runtime. Each observer is driven by a dedicated
//! worker loop fed by a bounded queue owned by the [`ObserverSet`](super::ObserverSet).
//!
//! ## Contract
//! - Implementations may be slow; they never block the receive loop.
//! - Each observer declares its queue capacity via [`Observe::queue_capacity`].
//!   If the queue overflows, events for that observer are **dropped** (warn).
//!
//! ## Example
//! ```rust
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use sawtk_subscriber::{Observe, RuntimeEvent, RuntimeEventKind};
//!
//! #[derive(Default)]
//! struct NoHandlerCounter(AtomicU64);
//!
//! #[async_trait::async_trait]
//! impl Observe for NoHandlerCounter {
//!     async fn on_event(&self, ev: &RuntimeEvent) {
//!         if ev.kind == RuntimeEventKind::NoHandler {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "no-handler-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::RuntimeEvent;

/// Contract for runtime event observers.
///
/// Called from an observer-dedicated worker task.
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handle a single runtime event.
    async fn on_event(&self, event: &RuntimeEvent);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this observer's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
