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

//! Structured telemetry over `tracing`
//!
//! Every emitted event carries an event name plus key/value context
//! (trace_id, request_id, phase, durations, error kinds). Values stored
//! under sensitive keys are redacted before emission; a full token or
//! password never reaches a log sink.

use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Key/value context attached to one telemetry event
pub type Fields = BTreeMap<String, JsonValue>;

/// Keys whose values are redacted, matched as case-insensitive substrings
pub const REDACT_KEYS: [&str; 5] = ["password", "token", "authorization", "api_key", "api-key"];

/// Build a [`Fields`] map from literal key/value pairs.
#[macro_export]
macro_rules! log_fields {
    ($($key:literal => $value:expr),* $(,)?) => {{
        let mut fields = $crate::telemetry::Fields::new();
        $(fields.insert($key.to_string(), ::serde_json::json!($value));)*
        fields
    }};
}

/// Trace-id lifecycle shared across the components of one session
///
/// A trace id spans one user-visible operation (a login, a connection) and
/// stamps every log line and wire message it produces.
#[derive(Clone, Default)]
pub struct TraceContext {
    current: Arc<Mutex<Option<String>>>,
}

impl TraceContext {
    /// Create an empty trace context
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh trace, replacing any current one
    pub fn begin_trace(&self) -> String {
        let id = new_id();
        *self.lock() = Some(id.clone());
        id
    }

    /// Current trace id, if a trace is active
    pub fn trace_id(&self) -> Option<String> {
        self.lock().clone()
    }

    /// Current trace id, starting a fresh trace if none is active
    pub fn ensure_trace_id(&self) -> String {
        let mut current = self.lock();
        match current.as_ref() {
            Some(id) => id.clone(),
            None => {
                let id = new_id();
                *current = Some(id.clone());
                id
            }
        }
    }

    /// Drop the current trace
    pub fn clear(&self) {
        *self.lock() = None;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Fresh request id for correlating one request with its response
pub fn new_request_id() -> String {
    new_id()
}

/// First eight characters of a trace id, for compact display
pub fn short_trace_id(trace_id: &str) -> &str {
    &trace_id[..trace_id.len().min(8)]
}

/// Mask a sensitive value: first four + last four characters, or `***`
/// when too short to keep anything.
pub fn redact_value(value: &JsonValue) -> JsonValue {
    let JsonValue::String(s) = value else {
        return value.clone();
    };
    if s.chars().count() <= 8 {
        return JsonValue::String("***".to_string());
    }
    let head: String = s.chars().take(4).collect();
    let tail: String = s.chars().rev().take(4).collect::<Vec<_>>().into_iter().rev().collect();
    JsonValue::String(format!("{head}...{tail}"))
}

/// Redact every field whose key contains a sensitive substring
pub fn sanitize(fields: &Fields) -> Fields {
    fields
        .iter()
        .map(|(key, value)| {
            let lower = key.to_lowercase();
            if REDACT_KEYS.iter().any(|sensitive| lower.contains(sensitive)) {
                (key.clone(), redact_value(value))
            } else {
                (key.clone(), value.clone())
            }
        })
        .collect()
}

fn render_context(fields: &Fields) -> String {
    serde_json::to_string(&sanitize(fields)).unwrap_or_else(|_| "{}".to_string())
}

/// Emit an informational telemetry event
pub fn log_info(event: &str, fields: Fields) {
    let context = render_context(&fields);
    tracing::info!(target: "mistvale_client::telemetry", event, %context);
}

/// Emit an error telemetry event
pub fn log_error(event: &str, error: &dyn std::fmt::Display, mut fields: Fields) {
    fields.insert(
        "error_message".to_string(),
        JsonValue::String(error.to_string()),
    );
    let context = render_context(&fields);
    tracing::error!(target: "mistvale_client::telemetry", event, %context);
}

/// Emit a warning telemetry event
pub fn log_warn(event: &str, fields: Fields) {
    let context = render_context(&fields);
    tracing::warn!(target: "mistvale_client::telemetry", event, %context);
}
