//! # Subscription registry.
//!
//! Holds the declared [`EventSubscription`]s and the handler chains keyed by
//! event type. It is write-once-before-start: the subscriber owns it while in
//! `Created`, then [`Registry::freeze`] splits it into the subscription list
//! (sent in the subscribe request) and an immutable handler map (moved into
//! the router).
//!
//! ## Rules
//! - `subscribe` appends a subscription **and** a handler.
//! - `handle_func` appends a handler only.
//! - Handlers of one event type keep registration order.
//! - Nothing is ever removed.

use std::collections::HashMap;

use crate::handlers::HandlerRef;
use crate::message::{EventFilter, EventSubscription};

/// Ordered multimap: event type → handler chain.
pub(crate) type HandlerMap = HashMap<String, Vec<HandlerRef>>;

#[derive(Default)]
pub(crate) struct Registry {
    subscriptions: Vec<EventSubscription>,
    handlers: HandlerMap,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Records a subscription and appends `handler` to the type's chain.
    pub(crate) fn subscribe(
        &mut self,
        event_type: &str,
        handler: HandlerRef,
        filters: Vec<EventFilter>,
    ) {
        self.subscriptions
            .push(EventSubscription::new(event_type, filters));
        self.handle_func(event_type, handler);
    }

    /// Appends `handler` to the type's chain without a new subscription.
    pub(crate) fn handle_func(&mut self, event_type: &str, handler: HandlerRef) {
        self.handlers
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }

    /// Consumes the registry for the run.
    pub(crate) fn freeze(self) -> (Vec<EventSubscription>, HandlerMap) {
        (self.subscriptions, self.handlers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::HandlerFn;
    use crate::message::{Event, EventFilter};

    fn named(name: &'static str) -> HandlerRef {
        HandlerFn::arc(name, |_: &str, _: &Event| true)
    }

    #[test]
    fn test_subscriptions_and_chains_accumulate() {
        let mut reg = Registry::new();
        reg.subscribe("a", named("a1"), vec![EventFilter::simple_any("k", "v")]);
        reg.subscribe("a", named("a2"), Vec::new());
        reg.handle_func("a", named("a3"));
        reg.handle_func("b", named("b1"));

        let (subs, handlers) = reg.freeze();
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[0].event_type, "a");
        assert_eq!(subs[0].filters, vec![EventFilter::simple_any("k", "v")]);
        assert!(subs[1].filters.is_empty());

        let chain: Vec<&str> = handlers["a"].iter().map(|h| h.name()).collect();
        assert_eq!(chain, vec!["a1", "a2", "a3"]);
        assert_eq!(handlers["b"].len(), 1);
    }
}
