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

//! Parsed player commands
//!
//! A [`Command`] is the structured form of one line of player input. Most
//! variants map one-to-one onto an outbound wire message; [`Command::Empty`]
//! and [`Command::Unknown`] are local sentinels and are never transmitted.

use crate::message::Envelope;
use crate::state::ChatChannel;
use serde_json::{Map, Value as JsonValue, json};

/// Movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    North,
    South,
    East,
    West,
    Up,
    Down,
}

impl Direction {
    /// Wire name of the direction
    pub fn as_str(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured form of one line of player input
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Blank input; nothing to do
    Empty,

    /// Move through an exit
    Move { direction: Direction },

    /// Look at the current room
    Look,

    /// Speak on a chat channel; `target` only for private tells
    Chat {
        channel: ChatChannel,
        target: Option<String>,
        content: String,
    },

    /// Attack a target with a skill
    CombatAttack { target: String, skill: String },

    /// List available quests
    QuestList,

    /// Accept a quest by id
    QuestAccept { quest_id: String },

    /// Show command help
    Help,

    /// List online players
    Who,

    /// Show inventory
    Inventory,

    /// Show character status
    Status,

    /// Free-form text deferred to the server for interpretation
    PlayerInput { text: String },

    /// Slash input with an unrecognized verb
    Unknown { command: String },
}

impl Command {
    /// Wire message type for sendable commands; `None` for local sentinels
    pub fn message_type(&self) -> Option<&'static str> {
        match self {
            Self::Empty | Self::Unknown { .. } => None,
            Self::Move { .. } => Some("move"),
            Self::Look => Some("look"),
            Self::Chat { .. } => Some("chat"),
            Self::CombatAttack { .. } => Some("combat_attack"),
            Self::QuestList => Some("quest_list"),
            Self::QuestAccept { .. } => Some("quest_accept"),
            Self::Help => Some("help"),
            Self::Who => Some("who"),
            Self::Inventory => Some("inventory"),
            Self::Status => Some("status"),
            Self::PlayerInput { .. } => Some("player_input"),
        }
    }

    /// Wire payload for this command
    pub fn payload(&self) -> JsonValue {
        match self {
            Self::Empty | Self::Look | Self::QuestList | Self::Help | Self::Who
            | Self::Inventory | Self::Status => json!({}),
            Self::Move { direction } => json!({ "direction": direction.as_str() }),
            Self::Chat {
                channel,
                target,
                content,
            } => {
                let mut data = Map::new();
                data.insert("channel".to_string(), json!(channel.as_str()));
                if let Some(target) = target {
                    data.insert("target".to_string(), json!(target));
                }
                data.insert("content".to_string(), json!(content));
                JsonValue::Object(data)
            }
            Self::CombatAttack { target, skill } => {
                json!({ "target": target, "skill": skill })
            }
            Self::QuestAccept { quest_id } => json!({ "quest_id": quest_id }),
            Self::PlayerInput { text } => json!({ "text": text }),
            Self::Unknown { command } => json!({ "command": command }),
        }
    }

    /// Convert into an outbound envelope; `None` for local sentinels
    pub fn into_envelope(self) -> Option<Envelope> {
        let message_type = self.message_type()?;
        Some(Envelope::new(message_type, self.payload()))
    }
}
