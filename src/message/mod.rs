//! Wire model exchanged with the validator.
//!
//! ## Contents
//! - [`MessageType`] numeric tag of every frame
//! - [`Event`], [`Attribute`], [`EventList`] decoded notifications
//! - [`EventSubscription`], [`EventFilter`], [`FilterType`] subscription declarations
//! - [`SubscribeRequest`], [`SubscribeResponse`], [`UnsubscribeRequest`], [`UnsubscribeResponse`]
//! - [`codec`] payload encode/decode helpers
//!
//! The subscriber core never inspects filters; it forwards them verbatim in the
//! subscribe request.

pub mod codec;
mod event;
mod request;
mod subscription;
mod types;

pub use event::{Attribute, Event, EventList};
pub use request::{
    SubscribeRequest, SubscribeResponse, SubscribeStatus, UnsubscribeRequest,
    UnsubscribeResponse, UnsubscribeStatus,
};
pub use subscription::{EventFilter, EventSubscription, FilterType};
pub use types::MessageType;

/// Event type emitted by the validator for every committed block.
pub const BLOCK_COMMIT: &str = "sawtooth/block-commit";

/// Event type emitted by the validator for state changes in committed blocks.
pub const STATE_DELTA: &str = "sawtooth/state-delta";
