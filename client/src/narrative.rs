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

//! In-fiction narrative text for client-side conditions
//!
//! Pure lookup tables mapping error codes and connection states to the
//! flavor lines shown in the world log. Server-generated narrative arrives
//! over the wire; these cover only conditions the client detects itself.

use mistvale_common::ConnectionStatus;

/// Narrative line for a server error code
pub fn error_to_narrative(error: &str) -> &'static str {
    match error {
        "connection_failed" => "Your senses dull; the world beyond slips out of reach...",
        "auth_failed" => "The gate warden squints at your seal and shakes his head...",
        "timeout" => "Mist closes in around you, and for a moment you lose your bearings...",
        "server_error" => "The ground trembles faintly, as if something vast has shifted...",
        "invalid_command" => "You hesitate, unsure of what you meant to do...",
        "move_failed" => "There is no path in that direction.",
        "move_blocked" => "Someone is blocking your way.",
        "move_combat" => "You are in combat and cannot move.",
        "combat_target_invalid" => "There is no such target.",
        "combat_in_progress" => "You are already fighting.",
        "combat_not_in_range" => "Your target is too far away.",
        "pvp_target_offline" => "They are nowhere to be found in the vale.",
        "pvp_in_safe_zone" => "This is a sanctuary; no blood may be spilled here.",
        "pvp_level_diff" => "The gap between you is too great for an honorable duel.",
        "pvp_target_fighting" => "They are already locked in battle.",
        "guild_name_exists" => "That guild name is already taken.",
        "guild_not_found" => "No such guild exists.",
        "guild_full" => "That guild has no room for new members.",
        "guild_level_low" => "You lack the standing to found a guild.",
        "guild_not_enough_gold" => "You lack the gold to found a guild.",
        "quest_not_found" => "No such task has been posted.",
        "quest_prerequisites" => "You are not yet ready for that task.",
        "quest_already_active" => "You have already taken up that task.",
        "quest_already_completed" => "You have already seen that task through.",
        _ => "A strange ripple passes through the vale...",
    }
}

/// Narrative line for a connection status
pub fn status_to_narrative(status: ConnectionStatus) -> &'static str {
    match status {
        ConnectionStatus::Connecting => "You step toward the veil between worlds...",
        ConnectionStatus::Connected => "The vale takes shape around you.",
        ConnectionStatus::Disconnected => "The world fades to grey around you...",
        ConnectionStatus::Error => "Something tears at the veil between worlds...",
    }
}

const RECONNECT_NARRATIVES: [&str; 4] = [
    "You steady your breath and reach for the vale again...",
    "Mist swirls around you, thinning slowly...",
    "You push against the silence, seeking a way back...",
    "The world flickers at the edge of your senses...",
];

/// Cycling narrative line for the nth reconnect attempt
pub fn reconnect_narrative(retry_count: u32) -> &'static str {
    RECONNECT_NARRATIVES[retry_count as usize % RECONNECT_NARRATIVES.len()]
}

/// Render an epoch-millisecond timestamp as local wall-clock time
pub fn format_time(timestamp_ms: i64) -> String {
    use chrono::TimeZone;
    match chrono::Local.timestamp_millis_opt(timestamp_ms) {
        chrono::LocalResult::Single(time) => time.format("%H:%M:%S").to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_error_maps_to_fixed_line() {
        assert_eq!(
            error_to_narrative("move_failed"),
            "There is no path in that direction."
        );
    }

    #[test]
    fn test_unknown_error_maps_to_fallback() {
        assert_eq!(
            error_to_narrative("sharks_with_lasers"),
            "A strange ripple passes through the vale..."
        );
    }

    #[test]
    fn test_reconnect_narrative_cycles() {
        assert_eq!(reconnect_narrative(0), reconnect_narrative(4));
        assert_eq!(reconnect_narrative(1), reconnect_narrative(5));
        assert_ne!(reconnect_narrative(0), reconnect_narrative(1));
    }

    #[test]
    fn test_format_time_renders_clock() {
        let rendered = format_time(1_700_000_000_000);
        assert_eq!(rendered.len(), 8);
        assert_eq!(rendered.matches(':').count(), 2);
    }
}
