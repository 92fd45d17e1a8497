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

//! Inbound message dispatch
//!
//! Converts one decoded server message at a time into state-store
//! mutations. Each message's effects complete before the next is handled;
//! the reader delivers messages serially. Unrecognized types are logged and
//! ignored, and a payload that fails to decode drops that message without
//! touching the store.

use crate::log_fields;
use crate::store::GameStore;
use crate::telemetry;
use mistvale_common::ServerMessage;
use mistvale_common::state::{
    ChatMessage, CombatState, Notification, NotificationKind, Room, WorldEvent, WorldEventKind,
};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use uuid::Uuid;

const AUTH_FAILED_MESSAGE: &str = "Authentication failed.";
const ACTION_FAILED_MESSAGE: &str = "The action failed.";
const COMBAT_ROUND_MESSAGE: &str = "The battle rages on...";
const COMBAT_END_MESSAGE: &str = "The battle is over.";
const QUEST_UPDATE_MESSAGE: &str = "Your quest log has been updated.";

/// Applies inbound messages to the game store
#[derive(Clone)]
pub struct Dispatcher {
    store: Arc<GameStore>,
}

impl Dispatcher {
    pub fn new(store: Arc<GameStore>) -> Self {
        Self { store }
    }

    /// Apply one inbound message
    pub fn handle(&self, message: &ServerMessage) {
        match message.message_type.as_str() {
            "auth_ok" => {
                if let Some(player) = message.data.get("player") {
                    self.store.merge_player(player);
                }
                if let Some(room) = message.data.get("room") {
                    self.apply_room(room.clone(), message);
                }
            }
            "auth_failed" => {
                let text = string_field(&message.data, "message")
                    .unwrap_or_else(|| AUTH_FAILED_MESSAGE.to_string());
                self.store
                    .add_notification(Notification::new(NotificationKind::Error, text));
            }
            "room_update" => {
                self.apply_room(message.data.clone(), message);
            }
            "player_update" => {
                self.store.merge_player(&message.data);
            }
            "world_event" => {
                let kind = message
                    .data
                    .get("type")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                self.store.push_world_event(WorldEvent {
                    id: string_field(&message.data, "id").unwrap_or_else(new_id),
                    kind,
                    title: string_field(&message.data, "title"),
                    content: string_field(&message.data, "content").unwrap_or_default(),
                    timestamp: message.timestamp,
                    importance: None,
                });
            }
            "online_update" => {
                let count = message.data.get("count").map_or(0, coerce_count);
                self.store.set_online_count(count);
            }
            "chat" => {
                let channel = message
                    .data
                    .get("channel")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                let sender = message
                    .data
                    .get("sender")
                    .and_then(|v| serde_json::from_value(v.clone()).ok())
                    .unwrap_or_default();
                self.store.push_chat_message(ChatMessage {
                    id: string_field(&message.data, "id").unwrap_or_else(new_id),
                    channel,
                    sender,
                    content: string_field(&message.data, "content").unwrap_or_default(),
                    timestamp: message.timestamp,
                });
            }
            "combat_start" => {
                if let Some(combat) = self.decode_combat(message) {
                    self.store.set_combat(combat);
                }
            }
            "combat_round" => {
                if let Some(combat) = self.decode_combat(message) {
                    let content = combat
                        .narrative
                        .clone()
                        .unwrap_or_else(|| COMBAT_ROUND_MESSAGE.to_string());
                    self.store.set_combat(combat);
                    self.store
                        .push_world_event(WorldEvent::now(WorldEventKind::Combat, content));
                }
            }
            "combat_end" => {
                self.store.clear_combat();
                let content = string_field(&message.data, "narrative")
                    .unwrap_or_else(|| COMBAT_END_MESSAGE.to_string());
                self.store
                    .push_world_event(WorldEvent::now(WorldEventKind::Combat, content));
            }
            "error" => {
                let text = string_field(&message.data, "narrative")
                    .or_else(|| string_field(&message.data, "message"))
                    .unwrap_or_else(|| ACTION_FAILED_MESSAGE.to_string());
                self.store
                    .push_world_event(WorldEvent::now(WorldEventKind::System, text.clone()));
                self.store
                    .add_notification(Notification::new(NotificationKind::Error, text));
            }
            "quest_update" => {
                let content = string_field(&message.data, "narrative")
                    .or_else(|| string_field(&message.data, "message"))
                    .unwrap_or_else(|| QUEST_UPDATE_MESSAGE.to_string());
                self.store.push_world_event(WorldEvent {
                    id: string_field(&message.data, "id").unwrap_or_else(new_id),
                    kind: WorldEventKind::Narrative,
                    title: None,
                    content,
                    timestamp: chrono::Utc::now().timestamp_millis(),
                    importance: None,
                });
            }
            "pong" => {
                // Heartbeat acknowledgment; no state change.
            }
            _ => {
                telemetry::log_info(
                    "ws.message.unhandled",
                    log_fields! {
                        "trace_id" => &message.trace_id,
                        "request_id" => &message.request_id,
                        "phase" => "ws_message",
                        "message_type" => &message.message_type,
                    },
                );
            }
        }
    }

    fn apply_room(&self, data: JsonValue, message: &ServerMessage) {
        match serde_json::from_value::<Room>(data) {
            Ok(room) => self.store.update_room(room),
            Err(err) => {
                telemetry::log_error(
                    "ws.message.parse_error",
                    &err,
                    log_fields! {
                        "trace_id" => &message.trace_id,
                        "phase" => "ws_message",
                        "error_kind" => "parse",
                        "message_type" => &message.message_type,
                    },
                );
            }
        }
    }

    fn decode_combat(&self, message: &ServerMessage) -> Option<CombatState> {
        match serde_json::from_value::<CombatState>(message.data.clone()) {
            Ok(combat) => Some(combat),
            Err(err) => {
                telemetry::log_error(
                    "ws.message.parse_error",
                    &err,
                    log_fields! {
                        "trace_id" => &message.trace_id,
                        "phase" => "ws_message",
                        "error_kind" => "parse",
                        "message_type" => &message.message_type,
                    },
                );
                None
            }
        }
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn string_field(data: &JsonValue, key: &str) -> Option<String> {
    data.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// Coerce an online count to a non-negative integer, zero on invalid input
fn coerce_count(value: &JsonValue) -> u64 {
    match value {
        JsonValue::Number(number) => number
            .as_u64()
            .or_else(|| number.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        JsonValue::String(text) => text.trim().parse::<u64>().unwrap_or(0),
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mistvale_common::Envelope;
    use mistvale_common::command::Command;
    use mistvale_common::state::{ChatChannel, ConnectionStatus, Player};
    use serde_json::json;

    fn setup() -> (Dispatcher, Arc<GameStore>) {
        let store = Arc::new(GameStore::new());
        (Dispatcher::new(Arc::clone(&store)), store)
    }

    fn inbound(message_type: &str, data: JsonValue) -> ServerMessage {
        Envelope::new(message_type, data)
    }

    #[test]
    fn test_auth_ok_applies_player_and_room() {
        let (dispatcher, store) = setup();
        store.set_player(Some(Player {
            id: "p1".to_string(),
            name: "Ayla".to_string(),
            ..Default::default()
        }));

        dispatcher.handle(&inbound(
            "auth_ok",
            json!({
                "player": {"hp": 90, "level": 6},
                "room": {"id": "r1", "name": "Square"}
            }),
        ));

        let player = store.player().unwrap();
        assert_eq!(player.hp, 90);
        assert_eq!(player.level, 6);
        assert_eq!(player.name, "Ayla");
        assert_eq!(store.current_room().unwrap().id, "r1");
    }

    #[test]
    fn test_auth_failed_emits_error_notification() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("auth_failed", json!({"message": "bad seal"})));

        let notifications = store.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].kind, NotificationKind::Error);
        assert_eq!(notifications[0].message, "bad seal");
    }

    #[test]
    fn test_auth_failed_default_message() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("auth_failed", json!({})));
        assert_eq!(store.notifications()[0].message, AUTH_FAILED_MESSAGE);
    }

    #[test]
    fn test_room_update_normalizes_missing_lists() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("room_update", json!({"id": "r2", "name": "Gate"})));

        let room = store.current_room().unwrap();
        assert_eq!(room.id, "r2");
        assert!(room.npcs.is_empty());
        assert!(room.players.is_empty());
        assert!(room.exits.is_empty());
    }

    #[test]
    fn test_room_update_bad_payload_is_swallowed() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("room_update", json!("not a room")));
        assert!(store.current_room().is_none());
    }

    #[test]
    fn test_player_update_merges() {
        let (dispatcher, store) = setup();
        store.set_player(Some(Player {
            id: "p1".to_string(),
            hp: 100,
            gold: 5,
            ..Default::default()
        }));
        dispatcher.handle(&inbound("player_update", json!({"hp": 60})));

        let player = store.player().unwrap();
        assert_eq!(player.hp, 60);
        assert_eq!(player.gold, 5);
    }

    #[test]
    fn test_world_event_appended_with_defaults() {
        let (dispatcher, store) = setup();
        let message = inbound("world_event", json!({"content": "A storm rolls in."}));
        dispatcher.handle(&message);

        let events = store.world_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, WorldEventKind::System);
        assert_eq!(events[0].content, "A storm rolls in.");
        assert_eq!(events[0].timestamp, message.timestamp);
        assert!(!events[0].id.is_empty());
    }

    #[test]
    fn test_world_event_keeps_server_fields() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound(
            "world_event",
            json!({"id": "e9", "type": "world", "content": "The gates open."}),
        ));

        let events = store.world_events();
        assert_eq!(events[0].id, "e9");
        assert_eq!(events[0].kind, WorldEventKind::World);
    }

    #[test]
    fn test_online_update_coercion() {
        let (dispatcher, store) = setup();

        dispatcher.handle(&inbound("online_update", json!({"count": 17})));
        assert_eq!(store.online_count(), 17);

        dispatcher.handle(&inbound("online_update", json!({"count": "42"})));
        assert_eq!(store.online_count(), 42);

        dispatcher.handle(&inbound("online_update", json!({"count": -3})));
        assert_eq!(store.online_count(), 0);

        dispatcher.handle(&inbound("online_update", json!({"count": "many"})));
        assert_eq!(store.online_count(), 0);

        dispatcher.handle(&inbound("online_update", json!({})));
        assert_eq!(store.online_count(), 0);
    }

    #[test]
    fn test_chat_appended() {
        let (dispatcher, store) = setup();
        let message = inbound(
            "chat",
            json!({
                "channel": "guild",
                "sender": {"id": "p2", "name": "Bram"},
                "content": "rally up"
            }),
        );
        dispatcher.handle(&message);

        let chat = store.chat_messages();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].channel, ChatChannel::Guild);
        assert_eq!(chat[0].sender.name, "Bram");
        assert_eq!(chat[0].content, "rally up");
        assert_eq!(chat[0].timestamp, message.timestamp);
    }

    #[test]
    fn test_chat_unknown_channel_defaults_to_room() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound(
            "chat",
            json!({"channel": "shouting", "content": "hey"}),
        ));
        assert_eq!(store.chat_messages()[0].channel, ChatChannel::Room);
    }

    #[test]
    fn test_combat_lifecycle() {
        let (dispatcher, store) = setup();

        dispatcher.handle(&inbound(
            "combat_start",
            json!({"combat_id": "c1", "type": "pve", "opponent": {"id": "wolf", "name": "Wolf", "hp": 30, "max_hp": 30}}),
        ));
        assert_eq!(store.combat().unwrap().combat_id, "c1");
        assert!(store.world_events().is_empty());

        dispatcher.handle(&inbound(
            "combat_round",
            json!({"combat_id": "c1", "round": 2, "narrative": "The wolf lunges!"}),
        ));
        assert_eq!(store.combat().unwrap().round, Some(2));
        let events = store.world_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, WorldEventKind::Combat);
        assert_eq!(events[0].content, "The wolf lunges!");

        dispatcher.handle(&inbound("combat_end", json!({"narrative": "The wolf falls."})));
        assert!(store.combat().is_none());
        let events = store.world_events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].content, "The wolf falls.");
    }

    #[test]
    fn test_combat_round_without_narrative_uses_default() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("combat_round", json!({"combat_id": "c1"})));
        assert_eq!(store.world_events()[0].content, COMBAT_ROUND_MESSAGE);
    }

    #[test]
    fn test_error_emits_event_and_notification() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("error", json!({"narrative": "The door holds fast."})));

        let events = store.world_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, WorldEventKind::System);
        assert_eq!(events[0].content, "The door holds fast.");

        let notifications = store.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].message, "The door holds fast.");
    }

    #[test]
    fn test_error_falls_back_message_then_generic() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("error", json!({"message": "nope"})));
        assert_eq!(store.world_events()[0].content, "nope");

        dispatcher.handle(&inbound("error", json!({})));
        assert_eq!(store.world_events()[1].content, ACTION_FAILED_MESSAGE);
    }

    #[test]
    fn test_quest_update_appends_narrative_event() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound(
            "quest_update",
            json!({"narrative": "A courier hands you a sealed letter."}),
        ));

        let events = store.world_events();
        assert_eq!(events[0].kind, WorldEventKind::Narrative);
        assert_eq!(events[0].content, "A courier hands you a sealed letter.");
    }

    #[test]
    fn test_pong_and_unknown_change_nothing() {
        let (dispatcher, store) = setup();
        dispatcher.handle(&inbound("pong", json!({})));
        dispatcher.handle(&inbound("npc_dialogue", json!({"text": "..."})));

        let snapshot = store.snapshot();
        assert!(snapshot.world_events.is_empty());
        assert!(snapshot.chat_messages.is_empty());
        assert!(snapshot.notifications.is_empty());
        assert!(snapshot.player.is_none());
        assert_eq!(snapshot.connection_status, ConnectionStatus::Disconnected);
    }

    #[test]
    fn test_chat_command_round_trip() {
        // A chat the client would send, mirrored back by the server,
        // lands in the log with the same channel and content.
        let (dispatcher, store) = setup();
        let command = Command::Chat {
            channel: ChatChannel::Room,
            target: None,
            content: "hello world".to_string(),
        };
        let outbound = command.into_envelope().unwrap();
        let wire = outbound.encode().unwrap();
        let mirrored = Envelope::parse(&wire).unwrap();

        dispatcher.handle(&mirrored);

        let chat = store.chat_messages();
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].channel, ChatChannel::Room);
        assert_eq!(chat[0].content, "hello world");
        assert_eq!(chat[0].timestamp, mirrored.timestamp);
    }
}
