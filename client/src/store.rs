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

//! Shared game state container
//!
//! One lock guards the whole session view. Every mutation replaces its slice
//! of state atomically, so a reader between two operations always sees a
//! fully consistent snapshot. Mutations are synchronous and the lock is
//! never held across an await point.

use mistvale_common::state::{
    ChatChannel, ChatMessage, CombatState, ConnectionStatus, Notification, Npc, Player, Room,
    WorldEvent,
};
use serde_json::Value as JsonValue;
use std::collections::VecDeque;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// World event log cap; older entries are trimmed first
pub const MAX_WORLD_EVENTS: usize = 100;

/// Chat log cap; older entries are trimmed first
pub const MAX_CHAT_MESSAGES: usize = 200;

/// One session's view of the game world
#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub is_authenticated: bool,
    pub connection_status: ConnectionStatus,
    pub online_count: u64,
    pub player: Option<Player>,
    pub current_room: Option<Room>,
    pub online_players: Vec<Player>,
    pub npcs_in_room: Vec<Npc>,
    pub world_events: VecDeque<WorldEvent>,
    pub chat_messages: VecDeque<ChatMessage>,
    pub active_chat_tab: ChatChannel,
    pub combat: Option<CombatState>,
    pub notifications: Vec<Notification>,
}

/// Shared, mutation-operation-only state container
///
/// Created once at process start with all-default values and discarded at
/// exit; nothing here is persisted.
#[derive(Debug, Default)]
pub struct GameStore {
    state: RwLock<GameState>,
}

impl GameStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, GameState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, GameState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Full consistent copy of the current state
    pub fn snapshot(&self) -> GameState {
        self.read().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().is_authenticated
    }

    pub fn set_authenticated(&self, value: bool) {
        self.write().is_authenticated = value;
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.read().connection_status
    }

    pub fn set_connection_status(&self, status: ConnectionStatus) {
        self.write().connection_status = status;
    }

    pub fn online_count(&self) -> u64 {
        self.read().online_count
    }

    pub fn set_online_count(&self, count: u64) {
        self.write().online_count = count;
    }

    pub fn player(&self) -> Option<Player> {
        self.read().player.clone()
    }

    pub fn set_player(&self, player: Option<Player>) {
        self.write().player = player;
    }

    /// Merge a partial update into the current player snapshot
    ///
    /// Unknown fields are ignored; with no current player this is a no-op.
    /// A patch that does not decode back into a player leaves the snapshot
    /// unchanged.
    pub fn merge_player(&self, patch: &JsonValue) {
        let JsonValue::Object(patch) = patch else {
            return;
        };
        let mut state = self.write();
        let Some(player) = state.player.as_ref() else {
            return;
        };
        let mut merged = match serde_json::to_value(player) {
            Ok(JsonValue::Object(map)) => map,
            _ => return,
        };
        for (key, value) in patch {
            merged.insert(key.clone(), value.clone());
        }
        match serde_json::from_value::<Player>(JsonValue::Object(merged)) {
            Ok(updated) => state.player = Some(updated),
            Err(err) => tracing::warn!("Discarding unusable player update: {}", err),
        }
    }

    pub fn current_room(&self) -> Option<Room> {
        self.read().current_room.clone()
    }

    /// Replace the current room snapshot
    ///
    /// The room's player and NPC lists also become the online-players and
    /// room-NPC views. List fields are already normalized to concrete
    /// (possibly empty) vectors by the snapshot decoder.
    pub fn update_room(&self, room: Room) {
        let mut state = self.write();
        state.online_players = room.players.clone();
        state.npcs_in_room = room.npcs.clone();
        state.current_room = Some(room);
    }

    pub fn online_players(&self) -> Vec<Player> {
        self.read().online_players.clone()
    }

    pub fn npcs_in_room(&self) -> Vec<Npc> {
        self.read().npcs_in_room.clone()
    }

    pub fn world_events(&self) -> Vec<WorldEvent> {
        self.read().world_events.iter().cloned().collect()
    }

    /// Append to the world event log, trimming the oldest entries beyond
    /// [`MAX_WORLD_EVENTS`]
    pub fn push_world_event(&self, event: WorldEvent) {
        let mut state = self.write();
        state.world_events.push_back(event);
        while state.world_events.len() > MAX_WORLD_EVENTS {
            state.world_events.pop_front();
        }
    }

    pub fn chat_messages(&self) -> Vec<ChatMessage> {
        self.read().chat_messages.iter().cloned().collect()
    }

    /// Append to the chat log, trimming the oldest entries beyond
    /// [`MAX_CHAT_MESSAGES`]
    pub fn push_chat_message(&self, message: ChatMessage) {
        let mut state = self.write();
        state.chat_messages.push_back(message);
        while state.chat_messages.len() > MAX_CHAT_MESSAGES {
            state.chat_messages.pop_front();
        }
    }

    pub fn active_chat_tab(&self) -> ChatChannel {
        self.read().active_chat_tab
    }

    /// Advance the active chat tab cyclically over room/guild/private
    pub fn cycle_chat_tab(&self, reverse: bool) {
        let mut state = self.write();
        state.active_chat_tab = if reverse {
            state.active_chat_tab.prev_tab()
        } else {
            state.active_chat_tab.next_tab()
        };
    }

    pub fn combat(&self) -> Option<CombatState> {
        self.read().combat.clone()
    }

    /// Replace the active combat session
    pub fn set_combat(&self, combat: CombatState) {
        self.write().combat = Some(combat);
    }

    /// Clear the active combat session
    pub fn clear_combat(&self) {
        self.write().combat = None;
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.read().notifications.clone()
    }

    pub fn add_notification(&self, notification: Notification) {
        self.write().notifications.push(notification);
    }

    pub fn remove_notification(&self, id: &str) {
        self.write().notifications.retain(|n| n.id != id);
    }
}
