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

//! Game state snapshot types
//!
//! These are the client's local view of server-pushed state. Server payloads
//! are lenient: missing or null fields decode to defaults so a partial
//! snapshot never fails to apply.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// Decode `null` as the field's default, for servers that send explicit
/// nulls where a list or string is expected.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Connection lifecycle status
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    /// Transport connection attempt in progress
    Connecting,

    /// Transport open, traffic flowing
    Connected,

    /// No transport (includes closing/closed)
    #[default]
    Disconnected,

    /// Transport reported an error
    Error,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connecting => write!(f, "connecting"),
            Self::Connected => write!(f, "connected"),
            Self::Disconnected => write!(f, "disconnected"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Current player snapshot
///
/// Every field defaults so a partial update (e.g. the summary returned by
/// login) still decodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Player {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub level: u32,

    #[serde(default)]
    pub hp: i64,

    #[serde(default)]
    pub max_hp: i64,

    #[serde(default)]
    pub mp: i64,

    #[serde(default)]
    pub max_mp: i64,

    #[serde(default)]
    pub exp: i64,

    #[serde(default)]
    pub faction_id: Option<String>,

    #[serde(default)]
    pub guild_id: Option<String>,

    #[serde(default)]
    pub location_id: String,

    #[serde(default)]
    pub gold: i64,
}

/// NPC present in the current room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Npc {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,
}

/// Exit from the current room
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Exit {
    #[serde(default)]
    pub direction: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub target: String,
}

/// Current room snapshot
///
/// List fields are always concrete: absent or null `npcs`/`players`/`exits`
/// normalize to empty vectors when the snapshot is applied.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Room {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub npcs: Vec<Npc>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<Player>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub exits: Vec<Exit>,
}

/// Combat encounter type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatKind {
    #[default]
    Pve,
    Pvp,
}

/// Opponent in the active combat session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatOpponent {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub hp: i64,

    #[serde(default)]
    pub max_hp: i64,
}

/// Outcome of a finished combat session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CombatResult {
    Victory,
    Defeat,
    Flee,
}

/// Rewards granted when combat ends in victory
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatRewards {
    #[serde(default)]
    pub exp: i64,

    #[serde(default)]
    pub gold: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    pub items: Vec<JsonValue>,
}

/// The at-most-one active combat session, keyed by `combat_id`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombatState {
    #[serde(default)]
    pub combat_id: String,

    #[serde(rename = "type", default)]
    pub kind: CombatKind,

    #[serde(default)]
    pub opponent: CombatOpponent,

    #[serde(default)]
    pub narrative: Option<String>,

    #[serde(default)]
    pub round: Option<u32>,

    #[serde(default)]
    pub result: Option<CombatResult>,

    #[serde(default)]
    pub rewards: Option<CombatRewards>,
}

/// World event category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorldEventKind {
    #[default]
    System,
    World,
    Combat,
    Narrative,
}

/// Display weight for a world event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventImportance {
    Low,
    Normal,
    High,
}

/// Entry in the world event log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldEvent {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: WorldEventKind,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub timestamp: i64,

    #[serde(default)]
    pub importance: Option<EventImportance>,
}

impl WorldEvent {
    /// Create an event with a fresh id, stamped with the current time
    pub fn now(kind: WorldEventKind, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            title: None,
            content: content.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
            importance: None,
        }
    }
}

/// Chat channel selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatChannel {
    #[default]
    Room,
    Guild,
    Private,
    System,
}

impl ChatChannel {
    /// Channels a player can select as the active tab
    pub const TABS: [ChatChannel; 3] = [Self::Room, Self::Guild, Self::Private];

    /// Next selectable tab, wrapping around
    pub fn next_tab(self) -> Self {
        let index = Self::TABS.iter().position(|t| *t == self).unwrap_or(0);
        Self::TABS[(index + 1) % Self::TABS.len()]
    }

    /// Previous selectable tab, wrapping around
    pub fn prev_tab(self) -> Self {
        let index = Self::TABS.iter().position(|t| *t == self).unwrap_or(0);
        Self::TABS[(index + Self::TABS.len() - 1) % Self::TABS.len()]
    }

    /// Wire name of the channel
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Guild => "guild",
            Self::Private => "private",
            Self::System => "system",
        }
    }
}

impl std::fmt::Display for ChatChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Sender of a chat message
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatSender {
    #[serde(default)]
    pub id: String,

    #[serde(default)]
    pub name: String,
}

/// Entry in the chat log
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: String,

    #[serde(rename = "type", default)]
    pub channel: ChatChannel,

    #[serde(default)]
    pub sender: ChatSender,

    #[serde(default)]
    pub content: String,

    #[serde(default)]
    pub timestamp: i64,
}

/// Transient notification severity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

/// Transient on-screen notification, optionally self-expiring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,

    #[serde(rename = "type", default)]
    pub kind: NotificationKind,

    pub message: String,

    /// Display duration in milliseconds; `None` means until dismissed
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl Notification {
    /// Create a notification with a fresh id
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            kind,
            message: message.into(),
            duration_ms: None,
        }
    }
}
