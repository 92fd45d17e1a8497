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

//! Authentication REST client
//!
//! Performs the login/registration exchange that produces the session
//! token, persists the grant to storage, and maps failures onto the client
//! error taxonomy: transport failures are `network`/`timeout`, an
//! unparseable body is `parse`, a non-2xx status is `http`, and a 2xx
//! response with `success: false` is `auth`.

use crate::error::ClientError;
use crate::log_fields;
use crate::storage::{PLAYER_KEY, Storage, TOKEN_KEY};
use crate::telemetry::{self, TraceContext};
use mistvale_common::api::{AuthResponse, LoginRequest, RegisterRequest};
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::{Duration, Instant};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_FAILED_MESSAGE: &str = "API request failed";

/// Client for the authentication REST API
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    storage: Arc<Storage>,
    trace: TraceContext,
}

impl AuthClient {
    pub fn new(base_url: impl Into<String>, storage: Arc<Storage>, trace: TraceContext) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            storage,
            trace,
        }
    }

    /// Log in, persisting the token and player summary on success
    pub async fn login(&self, credentials: &LoginRequest) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self.api_request("/auth/login", credentials).await?;
        self.persist_grant(&response, "auth.login.success");
        Ok(response)
    }

    /// Register a new account, persisting the token on success
    pub async fn register(&self, request: &RegisterRequest) -> Result<AuthResponse, ClientError> {
        let response: AuthResponse = self.api_request("/auth/register", request).await?;
        self.persist_grant(&response, "auth.register.success");
        Ok(response)
    }

    /// Drop the persisted token and player summary
    pub fn logout(&self) {
        self.storage.remove(TOKEN_KEY);
        self.storage.remove(PLAYER_KEY);
    }

    /// Persisted session token, if any
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY)
    }

    pub fn is_logged_in(&self) -> bool {
        self.token().is_some()
    }

    fn persist_grant(&self, response: &AuthResponse, event: &str) {
        let Some(grant) = response.data.as_ref().filter(|_| response.success) else {
            return;
        };
        self.storage.set(TOKEN_KEY, grant.token.clone());
        if let Ok(player) = serde_json::to_string(&grant.player) {
            self.storage.set(PLAYER_KEY, player);
        }
        telemetry::log_info(
            event,
            log_fields! {
                "trace_id" => self.trace.ensure_trace_id(),
                "phase" => "auth_http",
                "player_id" => &grant.player.id,
            },
        );
    }

    async fn api_request<B, T>(&self, endpoint: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize,
        T: serde::de::DeserializeOwned,
    {
        let trace_id = self.trace.ensure_trace_id();
        let request_id = telemetry::new_request_id();
        let url = format!("{}{}", self.base_url, endpoint);
        let started = Instant::now();

        telemetry::log_info(
            "auth.http.request",
            log_fields! {
                "trace_id" => &trace_id,
                "request_id" => &request_id,
                "phase" => "auth_http",
                "endpoint" => endpoint,
                "method" => "POST",
            },
        );

        let response = match self
            .http
            .post(&url)
            .json(body)
            .header("X-Trace-ID", &trace_id)
            .header("X-Request-ID", &request_id)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                let err = ClientError::from(err);
                telemetry::log_error(
                    "auth.http.error",
                    &err,
                    log_fields! {
                        "trace_id" => &trace_id,
                        "request_id" => &request_id,
                        "phase" => "auth_http",
                        "endpoint" => endpoint,
                        "error_kind" => err.kind(),
                        "duration_ms" => started.elapsed().as_millis() as u64,
                    },
                );
                return Err(err);
            }
        };

        let status = response.status();
        let payload: JsonValue = match response.json().await {
            Ok(payload) => payload,
            Err(err) => {
                let err = ClientError::Parse(err.to_string());
                telemetry::log_error(
                    "auth.http.error",
                    &err,
                    log_fields! {
                        "trace_id" => &trace_id,
                        "request_id" => &request_id,
                        "phase" => "auth_http",
                        "endpoint" => endpoint,
                        "status_code" => status.as_u16(),
                        "error_kind" => err.kind(),
                        "duration_ms" => started.elapsed().as_millis() as u64,
                    },
                );
                return Err(err);
            }
        };

        telemetry::log_info(
            "auth.http.response",
            log_fields! {
                "trace_id" => &trace_id,
                "request_id" => &request_id,
                "phase" => "auth_http",
                "endpoint" => endpoint,
                "status_code" => status.as_u16(),
                "duration_ms" => started.elapsed().as_millis() as u64,
            },
        );

        let success = payload
            .get("success")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);
        if !status.is_success() || !success {
            let message = payload
                .get("message")
                .or_else(|| payload.get("error"))
                .and_then(JsonValue::as_str)
                .unwrap_or(REQUEST_FAILED_MESSAGE)
                .to_string();
            let err = if status.is_success() {
                ClientError::Auth(message)
            } else {
                ClientError::Http {
                    status: status.as_u16(),
                    message,
                }
            };
            telemetry::log_error(
                "auth.http.error",
                &err,
                log_fields! {
                    "trace_id" => &trace_id,
                    "request_id" => &request_id,
                    "phase" => "auth_http",
                    "endpoint" => endpoint,
                    "status_code" => status.as_u16(),
                    "error_kind" => err.kind(),
                    "duration_ms" => started.elapsed().as_millis() as u64,
                },
            );
            return Err(err);
        }

        serde_json::from_value(payload).map_err(|err| ClientError::Parse(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client(base_url: &str) -> (AuthClient, Arc<Storage>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path().join("storage.json")));
        let client = AuthClient::new(base_url, Arc::clone(&storage), TraceContext::new());
        (client, storage, dir)
    }

    #[test]
    fn test_logout_clears_storage() {
        let (client, storage, _dir) = test_client("http://127.0.0.1:1/api");
        storage.set(TOKEN_KEY, "abc");
        storage.set(PLAYER_KEY, "{}");

        assert!(client.is_logged_in());
        client.logout();
        assert!(!client.is_logged_in());
        assert!(storage.get(PLAYER_KEY).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_api_is_network_error() {
        // Port 1 on loopback refuses immediately.
        let (client, _storage, _dir) = test_client("http://127.0.0.1:1/api");
        let err = client
            .login(&LoginRequest {
                username: "ayla".to_string(),
                password: "hunter2".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "network");
        assert!(!client.is_logged_in());
    }
}
