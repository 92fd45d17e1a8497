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

//! Mistvale Client Library
//!
//! This library provides the session layer of the Mistvale client: the
//! WebSocket connection manager with heartbeat and reconnect backoff, the
//! inbound message dispatcher, the command parser, the shared game state
//! store, and the authentication/storage/telemetry plumbing around them.

pub mod auth;
pub mod config;
pub mod connection;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod narrative;
pub mod parser;
pub mod reconnect;
pub mod session;
pub mod storage;
pub mod store;
pub mod telemetry;

// Re-export commonly used types
pub use auth::AuthClient;
pub use connection::ConnectionManager;
pub use context::ClientContext;
pub use dispatch::Dispatcher;
pub use error::ClientError;
pub use parser::parse_command;
pub use reconnect::ReconnectPolicy;
pub use session::{ConnectionHistory, SessionSupervisor};
pub use store::GameStore;
