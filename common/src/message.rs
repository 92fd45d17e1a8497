//
// Copyright 2025-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Wire message envelope and JSON codec
//!
//! Every frame on the wire, in either direction, is a JSON object with a
//! `type` field, an epoch-millisecond `timestamp`, an opaque `data` payload,
//! and optional `trace_id`/`request_id` correlation fields:
//!
//! ```json
//! {
//!   "type": "chat",
//!   "timestamp": 1723000000000,
//!   "data": { "channel": "room", "content": "hello" },
//!   "trace_id": "3f2b...",
//!   "request_id": "9a41..."
//! }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Codec error types
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// Serialization or deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The message parsed but violates the envelope contract
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

/// Wire message envelope
///
/// The same shape carries both client-to-server and server-to-client
/// traffic; [`ClientMessage`] and [`ServerMessage`] name the direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Message type tag (e.g. "chat", "room_update", "ping")
    #[serde(rename = "type")]
    pub message_type: String,

    /// Milliseconds since the Unix epoch at send time
    #[serde(default)]
    pub timestamp: i64,

    /// Opaque structured payload, interpreted per message type
    #[serde(default)]
    pub data: JsonValue,

    /// Correlates a request with its log trail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,

    /// Correlates a request with its response
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

/// Outbound traffic
pub type ClientMessage = Envelope;

/// Inbound traffic
pub type ServerMessage = Envelope;

impl Envelope {
    /// Create a new envelope stamped with the current time
    pub fn new(message_type: impl Into<String>, data: JsonValue) -> Self {
        Self {
            message_type: message_type.into(),
            timestamp: Utc::now().timestamp_millis(),
            data,
            trace_id: None,
            request_id: None,
        }
    }

    /// Encode the envelope to a JSON string
    pub fn encode(&self) -> Result<String, CodecError> {
        serde_json::to_string(self).map_err(Into::into)
    }

    /// Parse an envelope from a JSON string
    pub fn parse(json: &str) -> Result<Self, CodecError> {
        serde_json::from_str(json).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_encode() {
        let envelope = Envelope::new("chat", json!({"channel": "room", "content": "hello"}));
        let encoded = envelope.encode().unwrap();
        assert!(encoded.contains("\"type\":\"chat\""));
        assert!(encoded.contains("\"channel\":\"room\""));
        assert!(encoded.contains("\"content\":\"hello\""));
    }

    #[test]
    fn test_envelope_parse() {
        let json = r#"{"type":"room_update","timestamp":1000,"data":{"id":"r1"}}"#;
        let envelope = Envelope::parse(json).unwrap();
        assert_eq!(envelope.message_type, "room_update");
        assert_eq!(envelope.timestamp, 1000);
        assert_eq!(envelope.data["id"], "r1");
        assert!(envelope.trace_id.is_none());
        assert!(envelope.request_id.is_none());
    }

    #[test]
    fn test_envelope_roundtrip() {
        let mut envelope = Envelope::new("combat_attack", json!({"target": "wolf"}));
        envelope.trace_id = Some("trace-1".to_string());
        envelope.request_id = Some("req-1".to_string());
        let encoded = envelope.encode().unwrap();
        let parsed = Envelope::parse(&encoded).unwrap();
        assert_eq!(envelope, parsed);
    }

    #[test]
    fn test_envelope_correlation_ids_omitted_when_absent() {
        let envelope = Envelope::new("ping", json!({}));
        let encoded = envelope.encode().unwrap();
        assert!(!encoded.contains("trace_id"));
        assert!(!encoded.contains("request_id"));
    }

    #[test]
    fn test_envelope_data_defaults_to_null() {
        let json = r#"{"type":"pong","timestamp":5}"#;
        let envelope = Envelope::parse(json).unwrap();
        assert!(envelope.data.is_null());
    }

    #[test]
    fn test_envelope_parse_garbage_fails() {
        assert!(Envelope::parse("not json at all").is_err());
    }

    #[test]
    fn test_envelope_parse_wrong_shape_fails() {
        // Valid JSON but missing the required type tag.
        assert!(Envelope::parse(r#"{"timestamp":1}"#).is_err());
    }

    #[test]
    fn test_envelope_timestamp_is_epoch_millis() {
        let envelope = Envelope::new("ping", json!({}));
        // Well past 2001 in milliseconds, impossible as seconds until 33658.
        assert!(envelope.timestamp > 1_000_000_000_000);
    }
}
