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

//! On-disk key/value storage for the session token
//!
//! A small JSON file holds the bearer token and the last player summary.
//! Loading tolerates a missing or corrupt file by starting empty, and save
//! failures are logged and swallowed; storage must never crash the client.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Storage key for the session token
pub const TOKEN_KEY: &str = "token";

/// Storage key for the persisted player summary
pub const PLAYER_KEY: &str = "player";

/// JSON-file-backed key/value store
pub struct Storage {
    path: PathBuf,
    data: Mutex<BTreeMap<String, String>>,
}

impl Storage {
    /// Open storage at `path`, loading existing contents when present
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = Mutex::new(Self::load(&path));
        Self { path, data }
    }

    fn load(path: &Path) -> BTreeMap<String, String> {
        match std::fs::read_to_string(path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|err| {
                tracing::warn!("Ignoring corrupt storage file {}: {}", path.display(), err);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        }
    }

    fn save(&self, data: &BTreeMap<String, String>) {
        let rendered = match serde_json::to_string_pretty(data) {
            Ok(rendered) => rendered,
            Err(err) => {
                tracing::warn!("Failed to serialize storage: {}", err);
                return;
            }
        };
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create storage dir {}: {}", parent.display(), err);
                return;
            }
        }
        if let Err(err) = std::fs::write(&self.path, rendered) {
            tracing::warn!("Failed to write storage file {}: {}", self.path.display(), err);
        }
    }

    /// Get a value by key
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Set a value, persisting to disk
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut data = self.lock();
        data.insert(key.into(), value.into());
        self.save(&data);
    }

    /// Remove a value, persisting to disk
    pub fn remove(&self, key: &str) {
        let mut data = self.lock();
        if data.remove(key).is_some() {
            self.save(&data);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_storage_set_get_remove() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("storage.json"));

        assert!(storage.get(TOKEN_KEY).is_none());
        storage.set(TOKEN_KEY, "abc123");
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("abc123"));

        storage.remove(TOKEN_KEY);
        assert!(storage.get(TOKEN_KEY).is_none());
    }

    #[test]
    fn test_storage_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");

        let storage = Storage::open(&path);
        storage.set(TOKEN_KEY, "abc123");
        storage.set(PLAYER_KEY, r#"{"id":"p1"}"#);
        drop(storage);

        let reopened = Storage::open(&path);
        assert_eq!(reopened.get(TOKEN_KEY).as_deref(), Some("abc123"));
        assert_eq!(reopened.get(PLAYER_KEY).as_deref(), Some(r#"{"id":"p1"}"#));
    }

    #[test]
    fn test_storage_tolerates_missing_file() {
        let dir = TempDir::new().unwrap();
        let storage = Storage::open(dir.path().join("missing").join("storage.json"));
        assert!(storage.get(TOKEN_KEY).is_none());
        // First write creates the parent directory.
        storage.set(TOKEN_KEY, "abc123");
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_storage_tolerates_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("storage.json");
        std::fs::write(&path, "{ not json").unwrap();

        let storage = Storage::open(&path);
        assert!(storage.get(TOKEN_KEY).is_none());
        storage.set(TOKEN_KEY, "fresh");
        assert_eq!(storage.get(TOKEN_KEY).as_deref(), Some("fresh"));
    }
}
