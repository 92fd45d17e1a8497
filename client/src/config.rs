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

use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_env_field::EnvField;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None)]
pub struct Arguments {
    #[arg(
        short = 'c',
        long = "config",
        help = "Path to configuration file",
        default_value = "client/config.yaml"
    )]
    pub config_file: String,

    #[arg(
        short = 'e',
        long = "env",
        help = "Path to environment file",
        default_value = "client/.env"
    )]
    pub env_file: Option<String>,

    #[arg(short = 'u', long = "username", help = "Log in as this account")]
    pub username: Option<String>,

    #[arg(
        short = 'p',
        long = "password",
        help = "Password for --username",
        requires = "username"
    )]
    pub password: Option<String>,
}

impl Default for Arguments {
    fn default() -> Self {
        Self {
            config_file: "config.yaml".to_string(),
            env_file: Some(".env".to_string()),
            username: None,
            password: None,
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Configuration {
    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

impl Configuration {
    pub fn load(path: &str) -> Result<Self, String> {
        tracing::debug!("Loading configuration from file: {}", path);
        let file =
            std::fs::File::open(path).map_err(|e| format!("Failed to open config file: {}", e))?;

        let conf = serde_yaml::from_reader(file)
            .map_err(|e| format!("Failed to parse config file: {}", e))?;

        Ok(conf)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket endpoint of the game server
    #[serde(default)]
    pub url: EnvField<WebSocketUrl>,

    /// Heartbeat interval in seconds (default: 30)
    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval: u64,

    /// First reconnect backoff delay in milliseconds (default: 1000)
    #[serde(default = "default_reconnect_initial_delay")]
    pub reconnect_initial_delay: u64,

    /// Reconnect backoff cap in milliseconds (default: 30000)
    #[serde(default = "default_reconnect_max_delay")]
    pub reconnect_max_delay: u64,

    /// Reconnect attempts before giving up (default: 5)
    #[serde(default = "default_reconnect_max_retries")]
    pub reconnect_max_retries: u32,
}

fn default_heartbeat_interval() -> u64 {
    30
}

fn default_reconnect_initial_delay() -> u64 {
    1000
}

fn default_reconnect_max_delay() -> u64 {
    30000
}

fn default_reconnect_max_retries() -> u32 {
    5
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            url: Default::default(),
            heartbeat_interval: default_heartbeat_interval(),
            reconnect_initial_delay: default_reconnect_initial_delay(),
            reconnect_max_delay: default_reconnect_max_delay(),
            reconnect_max_retries: default_reconnect_max_retries(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WebSocketUrl(String);

impl WebSocketUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for WebSocketUrl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("ws://") || s.starts_with("wss://") {
            Ok(Self(s.to_string()))
        } else {
            Err(format!("WebSocket URL must start with ws:// or wss://: {}", s))
        }
    }
}

impl Default for WebSocketUrl {
    fn default() -> Self {
        Self(String::from("ws://localhost:8080/ws"))
    }
}

impl std::fmt::Display for WebSocketUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the authentication REST API
    #[serde(default)]
    pub api_url: EnvField<ApiUrl>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiUrl(String);

impl ApiUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ApiUrl {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self(s.trim_end_matches('/').to_string()))
        } else {
            Err(format!("API URL must start with http:// or https://: {}", s))
        }
    }
}

impl Default for ApiUrl {
    fn default() -> Self {
        Self(String::from("http://localhost:8080/api"))
    }
}

impl std::fmt::Display for ApiUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path of the key/value storage file; `~` expands to the home directory
    #[serde(default)]
    pub path: EnvField<StoragePath>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Resolve to an absolute path, expanding a leading `~`
    pub fn resolve(&self) -> PathBuf {
        if let Some(rest) = self.0.strip_prefix("~/") {
            if let Some(home) = std::env::var_os("HOME") {
                return PathBuf::from(home).join(rest);
            }
        }
        PathBuf::from(&self.0)
    }
}

impl FromStr for StoragePath {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl Default for StoragePath {
    fn default() -> Self {
        Self(String::from("~/.mistvale/client-storage.json"))
    }
}

impl std::fmt::Display for StoragePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
