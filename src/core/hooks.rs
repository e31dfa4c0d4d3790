//! # Lifecycle callbacks.
//!
//! Optional closures the caller registers on the builder. `on_subscribed` and
//! `on_unsubscribed` run on the receive loop; `on_close` runs once during teardown.
//! A panic inside any hook is caught and logged.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use tracing::error;

use crate::message::{SubscribeResponse, UnsubscribeResponse};
use crate::observers::panic_message;

/// Called with the peer id and decoded subscribe response.
pub type OnSubscribed = Arc<dyn Fn(&str, &SubscribeResponse) + Send + Sync>;
/// Called with the peer id and decoded unsubscribe response.
pub type OnUnsubscribed = Arc<dyn Fn(&str, &UnsubscribeResponse) + Send + Sync>;
/// Called once when the subscriber closes.
pub type OnClose = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone, Default)]
pub(crate) struct Hooks {
    pub(crate) on_subscribed: Option<OnSubscribed>,
    pub(crate) on_unsubscribed: Option<OnUnsubscribed>,
    pub(crate) on_close: Option<OnClose>,
}

/// Runs `f`, logging instead of propagating a panic. Returns `false` on panic.
pub(crate) fn guarded(hook: &'static str, f: impl FnOnce()) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(panic) => {
            error!(hook, info = %panic_message(panic.as_ref()), "hook panicked");
            false
        }
    }
}
