//! # Decoded validator events.
//!
//! An [`Event`] is produced only by decoding an [`MessageType::EventBatch`](super::MessageType::EventBatch)
//! payload and is read-only to handlers.
//!
//! ## Example
//! ```rust
//! use sawtk_subscriber::message::{Attribute, Event};
//!
//! let ev = Event::new("sawtooth/block-commit")
//!     .with_attribute("block_num", "12")
//!     .with_attribute("block_id", "abc");
//!
//! assert_eq!(ev.attr("block_id"), Some((1, "abc")));
//! assert_eq!(ev.attr("missing"), None);
//! assert_eq!(ev.attributes[0], Attribute::new("block_num", "12"));
//! ```

use serde::{Deserialize, Serialize};

/// Key/value attribute of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub key: String,
    pub value: String,
}

impl Attribute {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A single notification delivered by the validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Type tag used to look up the handler chain.
    pub event_type: String,
    /// Ordered attributes.
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Opaque payload bytes.
    #[serde(default)]
    pub data: Vec<u8>,
}

impl Event {
    /// Creates an event without attributes or data.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            attributes: Vec::new(),
            data: Vec::new(),
        }
    }

    /// Appends an attribute.
    #[inline]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(key, value));
        self
    }

    /// Sets the payload bytes.
    #[inline]
    pub fn with_data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    /// Returns index and value of the first attribute named `key`.
    pub fn attr(&self, key: &str) -> Option<(usize, &str)> {
        self.attributes
            .iter()
            .enumerate()
            .find(|(_, a)| a.key == key)
            .map(|(i, a)| (i, a.value.as_str()))
    }
}

/// Payload of an event batch frame; order is delivery order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventList {
    pub events: Vec<Event>,
}

impl EventList {
    pub fn new(events: Vec<Event>) -> Self {
        Self { events }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_returns_first_match() {
        let ev = Event::new("t")
            .with_attribute("k", "first")
            .with_attribute("k", "second");
        assert_eq!(ev.attr("k"), Some((0, "first")));
    }

    #[test]
    fn test_missing_fields_default() {
        let ev: Event = serde_json::from_str(r#"{"event_type":"x"}"#).unwrap();
        assert!(ev.attributes.is_empty());
        assert!(ev.data.is_empty());
    }
}
