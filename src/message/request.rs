//! # Subscribe/unsubscribe handshake payloads.

use serde::{Deserialize, Serialize};

use super::EventSubscription;

/// Body of a [`MessageType::SubscribeRequest`](super::MessageType::SubscribeRequest) frame.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeRequest {
    /// Resume markers (last known block ids); may be empty.
    #[serde(default)]
    pub last_known_block_ids: Vec<String>,
    /// Every registered subscription, in registration order.
    pub subscriptions: Vec<EventSubscription>,
}

/// Result code of a subscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscribeStatus {
    Ok,
    /// A filter was malformed (e.g. an invalid regex).
    InvalidFilter,
    /// None of the last known block ids is known to the validator.
    UnknownBlock,
}

/// Body of a [`MessageType::SubscribeResponse`](super::MessageType::SubscribeResponse) frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeResponse {
    pub status: SubscribeStatus,
    #[serde(default)]
    pub response_message: String,
}

impl SubscribeResponse {
    pub fn ok() -> Self {
        Self {
            status: SubscribeStatus::Ok,
            response_message: String::new(),
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == SubscribeStatus::Ok
    }
}

/// Body of a [`MessageType::UnsubscribeRequest`](super::MessageType::UnsubscribeRequest) frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeRequest {}

/// Result code of an unsubscribe request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnsubscribeStatus {
    Ok,
    InternalError,
}

/// Body of a [`MessageType::UnsubscribeResponse`](super::MessageType::UnsubscribeResponse) frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsubscribeResponse {
    pub status: UnsubscribeStatus,
}

impl UnsubscribeResponse {
    pub fn ok() -> Self {
        Self {
            status: UnsubscribeStatus::Ok,
        }
    }

    #[inline]
    pub fn is_ok(&self) -> bool {
        self.status == UnsubscribeStatus::Ok
    }
}
