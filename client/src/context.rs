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

use crate::auth::AuthClient;
use crate::config::Configuration;
use crate::connection::ConnectionManager;
use crate::dispatch::Dispatcher;
use crate::events::Subscription;
use crate::reconnect::ReconnectPolicy;
use crate::session::SessionSupervisor;
use crate::storage::Storage;
use crate::store::GameStore;
use crate::telemetry::TraceContext;
use std::sync::Arc;
use std::time::Duration;

/// Client context containing shared resources
///
/// Constructed once at process start and handed to everything that needs
/// it; there are no module-level singletons.
#[derive(Clone)]
pub struct ClientContext {
    /// Shared game state container
    pub store: Arc<GameStore>,

    /// Token and player-summary persistence
    pub storage: Arc<Storage>,

    /// Trace-id lifecycle shared by every component
    pub trace: TraceContext,

    /// Owner of the live connection
    pub connection: ConnectionManager,

    /// Backoff scheduler for unexpected disconnects
    pub reconnect: ReconnectPolicy,

    /// Authentication REST client
    pub auth: Arc<AuthClient>,

    /// Reconnect trigger and logout owner
    pub supervisor: SessionSupervisor,
}

impl ClientContext {
    /// Create a new client context from configuration
    pub fn new(config: &Configuration) -> Self {
        let trace = TraceContext::new();
        let store = Arc::new(GameStore::new());
        let storage = Arc::new(Storage::open(config.storage.path.resolve()));
        let connection = ConnectionManager::new(
            config.connection.url.as_str(),
            Duration::from_secs(config.connection.heartbeat_interval),
            Arc::clone(&storage),
            trace.clone(),
        );
        let reconnect = ReconnectPolicy::new(
            connection.clone(),
            Arc::clone(&store),
            Duration::from_millis(config.connection.reconnect_initial_delay),
            Duration::from_millis(config.connection.reconnect_max_delay),
            config.connection.reconnect_max_retries,
        );
        let auth = Arc::new(AuthClient::new(
            config.auth.api_url.as_str(),
            Arc::clone(&storage),
            trace.clone(),
        ));
        let supervisor = SessionSupervisor::new(
            Arc::clone(&store),
            connection.clone(),
            reconnect.clone(),
            Arc::clone(&auth),
        );

        Self {
            store,
            storage,
            trace,
            connection,
            reconnect,
            auth,
            supervisor,
        }
    }

    /// Wire the dispatcher and supervisor to the connection
    ///
    /// The returned subscriptions keep the handlers registered; hold them
    /// for the life of the session.
    pub fn attach(&self) -> Vec<Subscription> {
        let dispatcher = Dispatcher::new(Arc::clone(&self.store));
        let dispatch_subscription = self
            .connection
            .on_message(move |message| dispatcher.handle(message));
        let supervisor_subscription = self.supervisor.attach();
        vec![dispatch_subscription, supervisor_subscription]
    }

    /// Get the game store
    pub fn store(&self) -> &Arc<GameStore> {
        &self.store
    }

    /// Get the connection manager
    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    /// Get the authentication client
    pub fn auth(&self) -> &Arc<AuthClient> {
        &self.auth
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mistvale_common::ConnectionStatus;

    #[tokio::test]
    async fn test_context_wires_components() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = format!("storage:\n  path: {}/storage.json\n", dir.path().display());
        let config: Configuration = serde_yaml::from_str(&yaml).unwrap();

        let context = ClientContext::new(&config);
        let _subscriptions = context.attach();

        assert_eq!(
            context.connection().status().await,
            ConnectionStatus::Disconnected
        );
        assert!(!context.store().is_authenticated());
        assert!(!context.auth().is_logged_in());
    }
}
