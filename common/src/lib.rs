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

//! Mistvale Common Types and Protocols
//!
//! This crate defines shared types used across the Mistvale client:
//! - Wire message envelope and JSON codec
//! - Game state snapshots (player, room, combat, world events, chat)
//! - Parsed player commands
//! - Authentication API request/response bodies

pub mod api;
pub mod command;
pub mod message;
pub mod state;

pub use command::{Command, Direction};
pub use message::{ClientMessage, CodecError, Envelope, ServerMessage};
pub use state::{
    ChatChannel, ChatMessage, CombatState, ConnectionStatus, Exit, Notification, Npc, Player, Room,
    WorldEvent, WorldEventKind,
};
