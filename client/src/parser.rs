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

//! Player input parsing
//!
//! Input starting with `!` or `/` is a slash command: the first token,
//! lower-cased, selects the verb. Everything else is free-form text sent to
//! the server as `player_input`. Under-argumented `tell`, `attack`, and
//! `quest accept` also fall through to `player_input` carrying the raw
//! trimmed line; the server decides what to make of it.

use mistvale_common::command::{Command, Direction};
use mistvale_common::state::ChatChannel;

/// Parse one line of player input into a structured command
///
/// Total over all inputs: blank input yields [`Command::Empty`] and an
/// unrecognized verb yields [`Command::Unknown`]; nothing is an error.
pub fn parse_command(input: &str) -> Command {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Command::Empty;
    }

    if !is_command_input(trimmed) {
        return Command::PlayerInput {
            text: trimmed.to_string(),
        };
    }

    let mut tokens = trimmed[1..].split_whitespace();
    let verb = match tokens.next() {
        Some(verb) => verb.to_lowercase(),
        None => {
            // A lone prefix character carries no verb.
            return Command::Unknown {
                command: String::new(),
            };
        }
    };
    let args: Vec<&str> = tokens.collect();

    match verb.as_str() {
        "n" | "north" => direction_command(Direction::North),
        "s" | "south" => direction_command(Direction::South),
        "e" | "east" => direction_command(Direction::East),
        "w" | "west" => direction_command(Direction::West),
        "u" | "up" => direction_command(Direction::Up),
        "d" | "down" => direction_command(Direction::Down),
        "look" | "l" => Command::Look,
        "say" => Command::Chat {
            channel: ChatChannel::Room,
            target: None,
            content: args.join(" "),
        },
        "tell" if args.len() >= 2 => Command::Chat {
            channel: ChatChannel::Private,
            target: Some(args[0].to_string()),
            content: args[1..].join(" "),
        },
        "guild" | "g" => Command::Chat {
            channel: ChatChannel::Guild,
            target: None,
            content: args.join(" "),
        },
        "attack" | "kill" if !args.is_empty() => Command::CombatAttack {
            target: args[0].to_string(),
            skill: args.get(1).unwrap_or(&"normal_attack").to_string(),
        },
        "quest" | "q" if args.is_empty() => Command::QuestList,
        "quest" | "q" if args[0] == "accept" && args.len() >= 2 => Command::QuestAccept {
            quest_id: args[1].to_string(),
        },
        "help" | "h" => Command::Help,
        "who" => Command::Who,
        "inventory" | "inv" | "i" => Command::Inventory,
        "status" | "stat" => Command::Status,
        // Under-argumented tell/attack/quest land here too and defer to the
        // server as natural language.
        "tell" | "attack" | "kill" | "quest" | "q" => Command::PlayerInput {
            text: trimmed.to_string(),
        },
        _ => Command::Unknown { command: verb },
    }
}

fn direction_command(direction: Direction) -> Command {
    Command::Move { direction }
}

/// Whether the trimmed input is a bare movement shorthand
pub fn is_movement_input(input: &str) -> bool {
    matches!(
        input.trim().to_lowercase().as_str(),
        "n" | "north" | "s" | "south" | "e" | "east" | "w" | "west" | "u" | "up" | "d" | "down"
    )
}

/// Whether the input opens with a spoken-text quote
pub fn is_chat_input(input: &str) -> bool {
    input.trim().starts_with('"')
}

/// Whether the input carries a command prefix
pub fn is_command_input(input: &str) -> bool {
    let trimmed = input.trim();
    trimmed.starts_with('!') || trimmed.starts_with('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_input_is_empty() {
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command("  "), Command::Empty);
        assert_eq!(parse_command("\t\n"), Command::Empty);
    }

    #[test]
    fn test_movement_shorthands() {
        assert_eq!(
            parse_command("/n"),
            Command::Move {
                direction: Direction::North
            }
        );
        assert_eq!(
            parse_command("/south"),
            Command::Move {
                direction: Direction::South
            }
        );
        assert_eq!(
            parse_command("!e"),
            Command::Move {
                direction: Direction::East
            }
        );
        assert_eq!(
            parse_command("/u"),
            Command::Move {
                direction: Direction::Up
            }
        );
        assert_eq!(
            parse_command("/DOWN"),
            Command::Move {
                direction: Direction::Down
            }
        );
    }

    #[test]
    fn test_go_alone_is_unknown() {
        assert_eq!(
            parse_command("/go"),
            Command::Unknown {
                command: "go".to_string()
            }
        );
    }

    #[test]
    fn test_look() {
        assert_eq!(parse_command("/look"), Command::Look);
        assert_eq!(parse_command("/l"), Command::Look);
    }

    #[test]
    fn test_say_joins_args_with_single_spaces() {
        assert_eq!(
            parse_command("/say hello   brave    world"),
            Command::Chat {
                channel: ChatChannel::Room,
                target: None,
                content: "hello brave world".to_string(),
            }
        );
    }

    #[test]
    fn test_say_without_args_is_empty_content() {
        assert_eq!(
            parse_command("/say"),
            Command::Chat {
                channel: ChatChannel::Room,
                target: None,
                content: String::new(),
            }
        );
    }

    #[test]
    fn test_tell_with_target_and_content() {
        assert_eq!(
            parse_command("/tell bob hi there"),
            Command::Chat {
                channel: ChatChannel::Private,
                target: Some("bob".to_string()),
                content: "hi there".to_string(),
            }
        );
    }

    #[test]
    fn test_tell_with_one_arg_falls_through() {
        assert_eq!(
            parse_command("/tell bob"),
            Command::PlayerInput {
                text: "/tell bob".to_string()
            }
        );
    }

    #[test]
    fn test_guild_chat() {
        assert_eq!(
            parse_command("/g rally at the gate"),
            Command::Chat {
                channel: ChatChannel::Guild,
                target: None,
                content: "rally at the gate".to_string(),
            }
        );
    }

    #[test]
    fn test_attack_with_skill() {
        assert_eq!(
            parse_command("/attack wolf fireball"),
            Command::CombatAttack {
                target: "wolf".to_string(),
                skill: "fireball".to_string(),
            }
        );
    }

    #[test]
    fn test_attack_defaults_skill() {
        assert_eq!(
            parse_command("/kill wolf"),
            Command::CombatAttack {
                target: "wolf".to_string(),
                skill: "normal_attack".to_string(),
            }
        );
    }

    #[test]
    fn test_attack_without_target_falls_through() {
        assert_eq!(
            parse_command("/attack"),
            Command::PlayerInput {
                text: "/attack".to_string()
            }
        );
    }

    #[test]
    fn test_quest_list_and_accept() {
        assert_eq!(parse_command("/quest"), Command::QuestList);
        assert_eq!(parse_command("/q"), Command::QuestList);
        assert_eq!(
            parse_command("/quest accept q42"),
            Command::QuestAccept {
                quest_id: "q42".to_string()
            }
        );
    }

    #[test]
    fn test_quest_odd_forms_fall_through() {
        assert_eq!(
            parse_command("/quest accept"),
            Command::PlayerInput {
                text: "/quest accept".to_string()
            }
        );
        assert_eq!(
            parse_command("/quest abandon q42"),
            Command::PlayerInput {
                text: "/quest abandon q42".to_string()
            }
        );
    }

    #[test]
    fn test_simple_verbs() {
        assert_eq!(parse_command("/help"), Command::Help);
        assert_eq!(parse_command("/h"), Command::Help);
        assert_eq!(parse_command("/who"), Command::Who);
        assert_eq!(parse_command("/inventory"), Command::Inventory);
        assert_eq!(parse_command("/inv"), Command::Inventory);
        assert_eq!(parse_command("/i"), Command::Inventory);
        assert_eq!(parse_command("/status"), Command::Status);
        assert_eq!(parse_command("/stat"), Command::Status);
    }

    #[test]
    fn test_unknown_verb() {
        assert_eq!(
            parse_command("/dance"),
            Command::Unknown {
                command: "dance".to_string()
            }
        );
    }

    #[test]
    fn test_lone_prefix_is_unknown() {
        assert_eq!(
            parse_command("/"),
            Command::Unknown {
                command: String::new()
            }
        );
    }

    #[test]
    fn test_plain_text_is_player_input() {
        assert_eq!(
            parse_command("hello world"),
            Command::PlayerInput {
                text: "hello world".to_string()
            }
        );
    }

    #[test]
    fn test_quoted_text_is_player_input() {
        assert_eq!(
            parse_command("\"hello everyone"),
            Command::PlayerInput {
                text: "\"hello everyone".to_string()
            }
        );
    }

    #[test]
    fn test_predicates() {
        assert!(is_movement_input(" North "));
        assert!(!is_movement_input("northward"));
        assert!(is_chat_input("  \"hello"));
        assert!(!is_chat_input("hello"));
        assert!(is_command_input("/look"));
        assert!(is_command_input("!look"));
        assert!(!is_command_input("look"));
    }
}
