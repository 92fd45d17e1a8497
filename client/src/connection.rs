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

//! WebSocket connection management
//!
//! The [`ConnectionManager`] owns the single live connection to the game
//! server: it dials, splits the socket into a guarded write half and a
//! reader task, runs the heartbeat, and fans decoded inbound messages and
//! status changes out to subscribers.
//!
//! Invariants:
//! - at most one transport handle exists at a time; a `connect` racing an
//!   open or in-flight connection joins the existing outcome
//! - no timer (heartbeat) survives a disconnect or transport close
//! - a decode failure on inbound data is logged and dropped, never fatal

use crate::error::ClientError;
use crate::events::{Registry, Subscription};
use crate::log_fields;
use crate::storage::{Storage, TOKEN_KEY};
use crate::telemetry::{self, TraceContext};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use futures_util::stream::{SplitSink, SplitStream, StreamExt};
use futures_util::SinkExt;
use mistvale_common::{ClientMessage, ConnectionStatus, Envelope, ServerMessage};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;
type SharedConnect = Shared<BoxFuture<'static, Result<(), ClientError>>>;

/// Owner of the single live connection to the game server
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

struct Inner {
    url: String,
    heartbeat_interval: Duration,
    storage: Arc<Storage>,
    trace: TraceContext,
    link: Mutex<Link>,
    /// Bumped by `disconnect` so an in-flight dial can tell its connection
    /// was closed underneath it.
    epoch: AtomicU64,
    message_handlers: Registry<ServerMessage>,
    status_handlers: Registry<ConnectionStatus>,
}

#[derive(Default)]
struct Link {
    writer: Option<WsSink>,
    in_flight: Option<SharedConnect>,
    heartbeat: Option<JoinHandle<()>>,
    reader: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Create a manager for the given endpoint
    ///
    /// `storage` supplies the session token when `connect` is not handed one
    /// explicitly.
    pub fn new(
        url: impl Into<String>,
        heartbeat_interval: Duration,
        storage: Arc<Storage>,
        trace: TraceContext,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                url: url.into(),
                heartbeat_interval,
                storage,
                trace,
                link: Mutex::new(Link::default()),
                epoch: AtomicU64::new(0),
                message_handlers: Registry::new(),
                status_handlers: Registry::new(),
            }),
        }
    }

    /// Establish the connection
    ///
    /// Already connected resolves immediately; a connect already in flight
    /// is joined rather than duplicated, so two racing callers share one
    /// dial and one outcome. Fails when no session token is available or
    /// the transport reports an error before opening.
    pub async fn connect(&self, token: Option<String>) -> Result<(), ClientError> {
        let attempt = {
            let mut link = self.inner.link.lock().await;
            if link.writer.is_some() {
                return Ok(());
            }
            match &link.in_flight {
                Some(attempt) => attempt.clone(),
                None => {
                    let attempt = self.clone().dial(token).boxed().shared();
                    link.in_flight = Some(attempt.clone());
                    attempt
                }
            }
        };
        attempt.await
    }

    async fn dial(self, token: Option<String>) -> Result<(), ClientError> {
        self.notify_status(ConnectionStatus::Connecting);

        let trace_id = self.inner.trace.ensure_trace_id();
        let request_id = telemetry::new_request_id();
        let started = Instant::now();
        let epoch = self.inner.epoch.load(Ordering::SeqCst);

        let token = match token.or_else(|| self.inner.storage.get(TOKEN_KEY)) {
            Some(token) => token,
            None => {
                let err = ClientError::Auth("no session token available".to_string());
                telemetry::log_error(
                    "ws.connect.fail",
                    &err,
                    log_fields! {
                        "trace_id" => &trace_id,
                        "request_id" => &request_id,
                        "phase" => "ws_connect",
                        "error_kind" => err.kind(),
                    },
                );
                self.clear_in_flight().await;
                self.notify_status(ConnectionStatus::Error);
                return Err(err);
            }
        };

        let url = format!(
            "{}?token={}&trace_id={}",
            self.inner.url,
            percent_encode(&token),
            percent_encode(&trace_id)
        );
        telemetry::log_info(
            "ws.connect.start",
            log_fields! {
                "trace_id" => &trace_id,
                "request_id" => &request_id,
                "phase" => "ws_connect",
                "ws_path" => &self.inner.url,
            },
        );

        let stream = match connect_async(url.as_str()).await {
            Ok((stream, _response)) => stream,
            Err(err) => {
                let err = ClientError::from(err);
                telemetry::log_error(
                    "ws.connect.error",
                    &err,
                    log_fields! {
                        "trace_id" => &trace_id,
                        "request_id" => &request_id,
                        "phase" => "ws_connect",
                        "error_kind" => err.kind(),
                    },
                );
                self.clear_in_flight().await;
                self.notify_status(ConnectionStatus::Error);
                // The failed dial also counts as a close, which is what
                // lets a later backoff retry observe the drop.
                self.notify_status(ConnectionStatus::Disconnected);
                return Err(err);
            }
        };

        let (writer, reader) = stream.split();
        {
            let mut link = self.inner.link.lock().await;
            if self.inner.epoch.load(Ordering::SeqCst) != epoch {
                // Disconnected while the dial was in flight; resolve the
                // attempt instead of leaving a stray socket behind.
                link.in_flight = None;
                drop(link);
                let mut writer = writer;
                let _ = writer.close().await;
                let err = ClientError::Network("connection closed during connect".to_string());
                telemetry::log_error(
                    "ws.connect.aborted",
                    &err,
                    log_fields! {
                        "trace_id" => &trace_id,
                        "request_id" => &request_id,
                        "phase" => "ws_connect",
                        "error_kind" => err.kind(),
                    },
                );
                return Err(err);
            }

            link.writer = Some(writer);
            link.reader = Some(tokio::spawn(
                self.clone().read_loop(reader, trace_id.clone()),
            ));
            link.heartbeat = Some(tokio::spawn(self.clone().heartbeat_loop()));
            link.in_flight = None;
        }

        telemetry::log_info(
            "ws.connect.success",
            log_fields! {
                "trace_id" => &trace_id,
                "request_id" => &request_id,
                "phase" => "ws_connect",
                "duration_ms" => started.elapsed().as_millis() as u64,
            },
        );
        self.notify_status(ConnectionStatus::Connected);
        Ok(())
    }

    /// Close the connection
    ///
    /// Stops the heartbeat, cancels connect bookkeeping, and closes the
    /// transport if open. Safe to call when already disconnected.
    pub async fn disconnect(&self) {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);

        let (writer, heartbeat, reader) = {
            let mut link = self.inner.link.lock().await;
            link.in_flight = None;
            (link.writer.take(), link.heartbeat.take(), link.reader.take())
        };

        if let Some(heartbeat) = heartbeat {
            heartbeat.abort();
        }
        if let Some(reader) = reader {
            reader.abort();
        }
        if let Some(mut writer) = writer {
            let _ = writer.close().await;
            telemetry::log_info(
                "ws.connect.close",
                log_fields! {
                    "trace_id" => self.inner.trace.ensure_trace_id(),
                    "phase" => "ws_connect",
                    "reason" => "client_disconnect",
                },
            );
            self.notify_status(ConnectionStatus::Disconnected);
        }
    }

    /// Transmit one message
    ///
    /// Returns whether the message was actually handed to an open
    /// transport. Outgoing envelopes are stamped with trace and request ids
    /// when absent.
    pub async fn send(&self, mut message: ClientMessage) -> bool {
        let mut link = self.inner.link.lock().await;
        let Some(writer) = link.writer.as_mut() else {
            return false;
        };

        if message.trace_id.is_none() {
            message.trace_id = Some(self.inner.trace.ensure_trace_id());
        }
        if message.request_id.is_none() {
            message.request_id = Some(telemetry::new_request_id());
        }

        let text = match message.encode() {
            Ok(text) => text,
            Err(err) => {
                telemetry::log_error(
                    "ws.message.send_error",
                    &err,
                    log_fields! {
                        "trace_id" => &message.trace_id,
                        "phase" => "ws_message",
                        "error_kind" => "parse",
                        "message_type" => &message.message_type,
                    },
                );
                return false;
            }
        };

        match writer.send(Message::Text(text.into())).await {
            Ok(()) => {
                telemetry::log_info(
                    "ws.message.out",
                    log_fields! {
                        "trace_id" => &message.trace_id,
                        "request_id" => &message.request_id,
                        "phase" => "ws_message",
                        "message_type" => &message.message_type,
                    },
                );
                true
            }
            Err(err) => {
                telemetry::log_error(
                    "ws.message.send_error",
                    &err,
                    log_fields! {
                        "trace_id" => &message.trace_id,
                        "phase" => "ws_message",
                        "error_kind" => "network",
                        "message_type" => &message.message_type,
                    },
                );
                false
            }
        }
    }

    /// Register an inbound-message handler
    pub fn on_message(&self, handler: impl Fn(&ServerMessage) + Send + Sync + 'static) -> Subscription {
        self.inner.message_handlers.subscribe(handler)
    }

    /// Register a status-change handler
    pub fn on_status(
        &self,
        handler: impl Fn(&ConnectionStatus) + Send + Sync + 'static,
    ) -> Subscription {
        self.inner.status_handlers.subscribe(handler)
    }

    /// Current status, derived from transport state
    ///
    /// A closing or closed transport reads as disconnected; `error` is only
    /// ever observed as an event.
    pub async fn status(&self) -> ConnectionStatus {
        let link = self.inner.link.lock().await;
        if link.writer.is_some() {
            ConnectionStatus::Connected
        } else if link.in_flight.is_some() {
            ConnectionStatus::Connecting
        } else {
            ConnectionStatus::Disconnected
        }
    }

    async fn clear_in_flight(&self) {
        self.inner.link.lock().await.in_flight = None;
    }

    fn notify_status(&self, status: ConnectionStatus) {
        self.inner.status_handlers.emit(&status);
    }

    async fn read_loop(self, mut reader: WsSource, trace_id: String) {
        while let Some(frame) = reader.next().await {
            match frame {
                Ok(Message::Text(text)) => self.handle_frame(text.as_str(), &trace_id),
                Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                    Ok(text) => self.handle_frame(text, &trace_id),
                    Err(err) => {
                        telemetry::log_error(
                            "ws.message.parse_error",
                            &err,
                            log_fields! {
                                "trace_id" => &trace_id,
                                "phase" => "ws_message",
                                "error_kind" => "parse",
                            },
                        );
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => continue, // transport-level ping/pong/frame
                Err(err) => {
                    telemetry::log_error(
                        "ws.stream.error",
                        &err,
                        log_fields! {
                            "trace_id" => &trace_id,
                            "phase" => "ws_message",
                            "error_kind" => "network",
                        },
                    );
                    self.notify_status(ConnectionStatus::Error);
                    break;
                }
            }
        }

        // Transport closed underneath us: drop the write half and stop the
        // heartbeat before anyone can send on a dead connection.
        {
            let mut link = self.inner.link.lock().await;
            link.writer = None;
            link.reader = None;
            if let Some(heartbeat) = link.heartbeat.take() {
                heartbeat.abort();
            }
        }
        telemetry::log_info(
            "ws.connect.close",
            log_fields! {
                "trace_id" => &trace_id,
                "phase" => "ws_connect",
                "reason" => "transport_close",
            },
        );
        self.notify_status(ConnectionStatus::Disconnected);
    }

    fn handle_frame(&self, text: &str, trace_id: &str) {
        match Envelope::parse(text) {
            Ok(message) => {
                telemetry::log_info(
                    "ws.message.in",
                    log_fields! {
                        "trace_id" => message.trace_id.as_deref().unwrap_or(trace_id),
                        "request_id" => &message.request_id,
                        "phase" => "ws_message",
                        "message_type" => &message.message_type,
                        "payload_size" => text.len(),
                    },
                );
                self.inner.message_handlers.emit(&message);
            }
            Err(err) => {
                telemetry::log_error(
                    "ws.message.parse_error",
                    &err,
                    log_fields! {
                        "trace_id" => trace_id,
                        "phase" => "ws_message",
                        "error_kind" => "parse",
                    },
                );
            }
        }
    }

    async fn heartbeat_loop(self) {
        loop {
            tokio::time::sleep(self.inner.heartbeat_interval).await;
            let ping = Envelope::new("ping", json!({}));
            if !self.send(ping).await {
                // No open transport; the owner of the link tears this task
                // down, so just wait for the next tick.
                continue;
            }
        }
    }
}

/// Percent-encode a query-string value
fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                encoded.push(byte as char);
            }
            _ => {
                encoded.push('%');
                encoded.push_str(&format!("{:02X}", byte));
            }
        }
    }
    encoded
}
