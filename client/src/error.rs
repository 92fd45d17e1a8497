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

//! Client error taxonomy
//!
//! Variants carry rendered strings rather than source errors so a connect
//! outcome can be shared between coalesced callers (the shared future
//! requires `Clone`).

use mistvale_common::CodecError;

/// Errors surfaced by the session layer
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    /// Transport unreachable or transport-level failure
    #[error("network error: {0}")]
    Network(String),

    /// Operation exceeded its deadline
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Non-2xx response from an auxiliary REST call
    #[error("http status {status}: {message}")]
    Http { status: u16, message: String },

    /// Malformed inbound payload or malformed server response body
    #[error("malformed payload: {0}")]
    Parse(String),

    /// Rejected credentials or missing token
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Unexpected or unknown message shape
    #[error("protocol violation: {0}")]
    Protocol(String),
}

impl ClientError {
    /// Stable tag for the `error_kind` telemetry field
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Timeout(_) => "timeout",
            Self::Http { .. } => "http",
            Self::Parse(_) => "parse",
            Self::Auth(_) => "auth",
            Self::Protocol(_) => "protocol",
        }
    }
}

impl From<CodecError> for ClientError {
    fn from(err: CodecError) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for ClientError {
    fn from(err: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Network(err.to_string())
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_decode() {
            Self::Parse(err.to_string())
        } else if let Some(status) = err.status() {
            Self::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_tags() {
        assert_eq!(ClientError::Network("down".into()).kind(), "network");
        assert_eq!(ClientError::Timeout("slow".into()).kind(), "timeout");
        assert_eq!(
            ClientError::Http {
                status: 502,
                message: "bad gateway".into()
            }
            .kind(),
            "http"
        );
        assert_eq!(ClientError::Parse("junk".into()).kind(), "parse");
        assert_eq!(ClientError::Auth("no token".into()).kind(), "auth");
        assert_eq!(ClientError::Protocol("odd frame".into()).kind(), "protocol");
    }

    #[test]
    fn test_error_display_includes_detail() {
        let err = ClientError::Http {
            status: 401,
            message: "Unauthorized".into(),
        };
        assert_eq!(err.to_string(), "http status 401: Unauthorized");
    }

    #[test]
    fn test_codec_error_maps_to_parse() {
        let bad = mistvale_common::Envelope::parse("{").unwrap_err();
        let err: ClientError = bad.into();
        assert_eq!(err.kind(), "parse");
    }
}
