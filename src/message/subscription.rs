//! # Subscription declarations.
//!
//! [`EventSubscription`] names an event type and carries an ordered list of
//! [`EventFilter`]s. Filters are predicate descriptors evaluated by the
//! validator; this crate passes them through untouched.

use serde::{Deserialize, Serialize};

/// How an [`EventFilter`] matches attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterType {
    /// Any attribute with the key equals the match string.
    SimpleAny,
    /// All attributes with the key equal the match string.
    SimpleAll,
    /// Any attribute with the key matches the regex.
    RegexAny,
    /// All attributes with the key match the regex.
    RegexAll,
}

/// Opaque filter descriptor forwarded in the subscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFilter {
    pub key: String,
    pub match_string: String,
    pub filter_type: FilterType,
}

impl EventFilter {
    pub fn new(key: impl Into<String>, match_string: impl Into<String>, filter_type: FilterType) -> Self {
        Self {
            key: key.into(),
            match_string: match_string.into(),
            filter_type,
        }
    }

    /// `SIMPLE_ANY` filter.
    pub fn simple_any(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, value, FilterType::SimpleAny)
    }

    /// `SIMPLE_ALL` filter.
    pub fn simple_all(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(key, value, FilterType::SimpleAll)
    }

    /// `REGEX_ANY` filter.
    pub fn regex_any(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(key, pattern, FilterType::RegexAny)
    }

    /// `REGEX_ALL` filter.
    pub fn regex_all(key: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(key, pattern, FilterType::RegexAll)
    }
}

/// One declared interest: an event type plus its filters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscription {
    pub event_type: String,
    #[serde(default)]
    pub filters: Vec<EventFilter>,
}

impl EventSubscription {
    pub fn new(event_type: impl Into<String>, filters: Vec<EventFilter>) -> Self {
        Self {
            event_type: event_type.into(),
            filters,
        }
    }
}
