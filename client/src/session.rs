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

//! Session supervision
//!
//! Glue between connection status and the rest of the session: mirrors
//! status into the store, tracks whether this session has ever been
//! connected, and decides when a disconnect qualifies for a backoff retry.
//! A drop before the first successful connection (say, a bad token) never
//! triggers retries; a drop after one does, as long as the player is still
//! meant to be logged in.

use crate::auth::AuthClient;
use crate::connection::ConnectionManager;
use crate::events::Subscription;
use crate::reconnect::ReconnectPolicy;
use crate::store::GameStore;
use mistvale_common::state::{ConnectionStatus, Notification, NotificationKind};
use std::sync::{Arc, Mutex};

const LOGGED_OUT_MESSAGE: &str = "You have logged out.";

/// Whether this session has ever held a live connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionHistory {
    /// No connection has succeeded yet
    NeverConnected,

    /// A connection succeeded earlier and has since dropped
    ConnectedBefore,

    /// A connection is live right now
    CurrentlyConnected,
}

/// Owner of the reconnect trigger and the logout sequence
#[derive(Clone)]
pub struct SessionSupervisor {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<GameStore>,
    connection: ConnectionManager,
    reconnect: ReconnectPolicy,
    auth: Arc<AuthClient>,
    history: Mutex<ConnectionHistory>,
}

impl SessionSupervisor {
    pub fn new(
        store: Arc<GameStore>,
        connection: ConnectionManager,
        reconnect: ReconnectPolicy,
        auth: Arc<AuthClient>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                connection,
                reconnect,
                auth,
                history: Mutex::new(ConnectionHistory::NeverConnected),
            }),
        }
    }

    /// Subscribe to connection status changes
    pub fn attach(&self) -> Subscription {
        let supervisor = self.clone();
        self.inner
            .connection
            .on_status(move |status| supervisor.handle_status(*status))
    }

    /// Apply one status change
    pub fn handle_status(&self, status: ConnectionStatus) {
        self.inner.store.set_connection_status(status);

        match status {
            ConnectionStatus::Connected => {
                *self.history_mut() = ConnectionHistory::CurrentlyConnected;
                // A pending retry is stale the moment we are back online.
                self.inner.reconnect.stop_reconnect();
            }
            ConnectionStatus::Disconnected => {
                let had_connected = {
                    let mut history = self.history_mut();
                    let had_connected = *history != ConnectionHistory::NeverConnected;
                    if *history == ConnectionHistory::CurrentlyConnected {
                        *history = ConnectionHistory::ConnectedBefore;
                    }
                    had_connected
                };
                if had_connected && self.inner.store.is_authenticated() {
                    self.inner.reconnect.start_reconnect();
                }
            }
            ConnectionStatus::Connecting | ConnectionStatus::Error => {}
        }
    }

    /// Current connection history
    pub fn history(&self) -> ConnectionHistory {
        *self.history_mut()
    }

    /// End the session: drop credentials, close the connection, reset state
    pub async fn logout(&self) {
        // Clear the flag first so the close's disconnected event cannot
        // schedule a retry.
        self.inner.store.set_authenticated(false);
        self.inner.reconnect.stop_reconnect();
        self.inner.connection.disconnect().await;
        self.inner.auth.logout();
        self.inner.store.set_player(None);
        self.inner
            .store
            .add_notification(Notification::new(NotificationKind::Info, LOGGED_OUT_MESSAGE));
    }

    fn history_mut(&self) -> std::sync::MutexGuard<'_, ConnectionHistory> {
        self.inner
            .history
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}
