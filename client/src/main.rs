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

//! Line-oriented terminal frontend for the Mistvale client.

use anyhow::Context as _;
use clap::Parser;
use mistvale_client::config::{Arguments, Configuration};
use mistvale_client::context::ClientContext;
use mistvale_client::narrative;
use mistvale_client::parser::parse_command;
use mistvale_common::api::{LoginRequest, PlayerSummary};
use mistvale_common::command::Command;
use mistvale_common::state::{Notification, NotificationKind, Player};
use mistvale_common::{ConnectionStatus, ServerMessage};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load arguments from the command line
    let arguments: Arguments = Parser::parse();

    // Initialize tracing/logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_level(true)
        .with_ansi(true)
        .init();

    // Load environment variables from .env file if specified
    if let Some(ref env_file) = arguments.env_file {
        if std::path::Path::new(env_file).exists() {
            tracing::debug!("Loading environment variables from file: {}", env_file);
            dotenv::from_filename(env_file).ok();
        }
    } else {
        tracing::debug!("Loading environment variables from default file");
        dotenv::dotenv().ok();
    }

    // Load configuration from a file with environment variable substitution
    let config = Configuration::load(&arguments.config_file)
        .map_err(anyhow::Error::msg)
        .context("Unable to load configuration file")?;

    debug!("Configuration loaded: {:?}", config);
    info!("Starting Mistvale Client...");

    let context = ClientContext::new(&config);
    let _wiring = context.attach();

    // Plain-terminal stand-in for the TUI: print status transitions and
    // the inbound traffic a player would watch.
    let _status_printer = context.connection.on_status(|status| {
        println!("* {}", narrative::status_to_narrative(*status));
    });
    let _message_printer = context.connection.on_message(render_message);

    establish_session(&context, &arguments).await?;

    info!("Connecting to {}", config.connection.url.as_str());
    context.connection.connect(None).await?;

    run_input_loop(&context).await?;

    context.reconnect.stop_reconnect();
    context.connection.disconnect().await;
    info!("Goodbye.");
    Ok(())
}

/// Authenticate from --username/--password, or resume the stored session
async fn establish_session(context: &ClientContext, arguments: &Arguments) -> anyhow::Result<()> {
    if let (Some(username), Some(password)) = (&arguments.username, &arguments.password) {
        let response = context
            .auth
            .login(&LoginRequest {
                username: username.clone(),
                password: password.clone(),
            })
            .await?;
        let grant = response
            .data
            .as_ref()
            .filter(|_| response.success)
            .context("Login did not return a session token")?;
        context.store.set_player(Some(summary_player(&grant.player)));
        context.store.set_authenticated(true);
        info!("Logged in as {}", grant.player.name);
        return Ok(());
    }

    if !context.auth.is_logged_in() {
        anyhow::bail!("No stored session; log in with --username and --password");
    }
    if let Some(raw) = context.storage.get(mistvale_client::storage::PLAYER_KEY) {
        if let Ok(player) = serde_json::from_str::<PlayerSummary>(&raw) {
            context.store.set_player(Some(summary_player(&player)));
        }
    }
    context.store.set_authenticated(true);
    Ok(())
}

fn summary_player(summary: &PlayerSummary) -> Player {
    Player {
        id: summary.id.clone(),
        name: summary.name.clone(),
        level: summary.level,
        ..Default::default()
    }
}

async fn run_input_loop(context: &ClientContext) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        if !handle_line(context, &line).await {
                            return Ok(());
                        }
                    }
                    None => return Ok(()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                return Ok(());
            }
        }
    }
}

/// Process one input line; returns false when the client should exit
async fn handle_line(context: &ClientContext, line: &str) -> bool {
    let trimmed = line.trim();
    match trimmed {
        "quit" | "/quit" => return false,
        "logout" | "/logout" => {
            context.supervisor.logout().await;
            return true;
        }
        _ => {}
    }

    let command = parse_command(line);
    if command == Command::Empty {
        return true;
    }

    if let Command::Unknown { command } = &command {
        context.store.add_notification(Notification::new(
            NotificationKind::Warning,
            format!("Unknown command: /{}", command),
        ));
        return true;
    }

    if context.connection.status().await != ConnectionStatus::Connected {
        context.store.add_notification(Notification::new(
            NotificationKind::Warning,
            "Not connected to the server.",
        ));
        println!("* Not connected to the server.");
        return true;
    }

    if let Some(envelope) = command.into_envelope() {
        if !context.connection.send(envelope).await {
            println!("* The message could not be sent.");
        }
    }
    true
}

/// Print one inbound message the way a player would see it
fn render_message(message: &ServerMessage) {
    let time = narrative::format_time(message.timestamp);
    match message.message_type.as_str() {
        "chat" => {
            let channel = message.data["channel"].as_str().unwrap_or("room");
            let sender = message.data["sender"]["name"].as_str().unwrap_or("someone");
            let content = message.data["content"].as_str().unwrap_or_default();
            println!("[{time}] [{channel}] {sender}: {content}");
        }
        "world_event" | "quest_update" => {
            let content = message.data["content"]
                .as_str()
                .or_else(|| message.data["narrative"].as_str())
                .unwrap_or_default();
            println!("[{time}] {content}");
        }
        "error" => {
            let code = message.data["error"].as_str().unwrap_or_default();
            let text = message.data["narrative"]
                .as_str()
                .or_else(|| message.data["message"].as_str())
                .map(str::to_string)
                .unwrap_or_else(|| narrative::error_to_narrative(code).to_string());
            println!("[{time}] {text}");
        }
        "online_update" => {
            if let Some(count) = message.data["count"].as_u64() {
                println!("[{time}] {count} adventurers walk the vale.");
            }
        }
        _ => {}
    }
}
