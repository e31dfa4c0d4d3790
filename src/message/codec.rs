//! # Payload codec.
//!
//! Thin serde layer used for frame payloads. The router and lifecycle code
//! only call [`encode`] and [`decode`]; swapping the wire format means
//! changing this file alone.

use serde::{Serialize, de::DeserializeOwned};

use crate::error::CodecError;

/// Serializes `value`; `what` names the message for error reporting.
pub fn encode<T: Serialize>(what: &'static str, value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|source| CodecError { what, source })
}

/// Deserializes `bytes` into `T`; `what` names the message for error reporting.
pub fn decode<T: DeserializeOwned>(what: &'static str, bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|source| CodecError { what, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{EventFilter, EventSubscription, SubscribeRequest};

    #[test]
    fn test_subscribe_request_keeps_filters_verbatim() {
        let req = SubscribeRequest {
            last_known_block_ids: vec!["b1".into()],
            subscriptions: vec![EventSubscription::new(
                "sawtooth/state-delta",
                vec![EventFilter::regex_any("address", "^abcdef.*")],
            )],
        };
        let bytes = encode("subscribe request", &req).unwrap();
        let back: SubscribeRequest = decode("subscribe request", &bytes).unwrap();
        assert_eq!(back, req);
    }

    #[test]
    fn test_decode_error_names_message() {
        let err = decode::<SubscribeRequest>("subscribe request", b"{not json").unwrap_err();
        assert_eq!(err.what, "subscribe request");
        assert!(err.to_string().starts_with("subscribe request: "));
    }
}
