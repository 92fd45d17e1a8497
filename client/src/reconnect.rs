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

//! Reconnect backoff policy
//!
//! After an unexpected disconnect the policy schedules a single delayed
//! reconnect attempt with exponential backoff and a retry ceiling. A failed
//! attempt is reported, not retried by the policy itself; the next retry is
//! triggered by the next disconnect event. Whether a disconnect qualifies
//! for retry at all is the session supervisor's decision, not this one's.

use crate::connection::ConnectionManager;
use crate::log_fields;
use crate::store::GameStore;
use crate::{narrative, telemetry};
use mistvale_common::state::{WorldEvent, WorldEventKind};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::task::JoinHandle;

const GIVE_UP_MESSAGE: &str =
    "Reconnection failed repeatedly; check your network connection and log in again.";

/// Exponential backoff reconnect scheduler
#[derive(Clone)]
pub struct ReconnectPolicy {
    inner: Arc<Inner>,
}

struct Inner {
    connection: ConnectionManager,
    store: Arc<GameStore>,
    initial_delay: Duration,
    max_delay: Duration,
    max_retries: u32,
    retry_count: AtomicU32,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ReconnectPolicy {
    pub fn new(
        connection: ConnectionManager,
        store: Arc<GameStore>,
        initial_delay: Duration,
        max_delay: Duration,
        max_retries: u32,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                connection,
                store,
                initial_delay,
                max_delay,
                max_retries,
                retry_count: AtomicU32::new(0),
                timer: Mutex::new(None),
            }),
        }
    }

    /// Backoff delay for the given retry: `min(initial * 2^retry, max)`
    pub fn backoff_delay(&self, retry_count: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry_count.min(31));
        self.inner
            .initial_delay
            .saturating_mul(factor)
            .min(self.inner.max_delay)
    }

    /// Completed reconnect attempts since the last reset
    pub fn retry_count(&self) -> u32 {
        self.inner.retry_count.load(Ordering::SeqCst)
    }

    /// Schedule the next reconnect attempt
    ///
    /// Returns whether an attempt was scheduled; at the retry ceiling a
    /// persistent give-up entry lands in the world log instead, where it
    /// stays visible even if the player was not watching the moment of
    /// failure.
    pub fn start_reconnect(&self) -> bool {
        let retry_count = self.retry_count();
        if retry_count >= self.inner.max_retries {
            telemetry::log_warn(
                "ws.reconnect.give_up",
                log_fields! {
                    "phase" => "ws_connect",
                    "reconnect_attempt" => retry_count,
                },
            );
            self.inner
                .store
                .push_world_event(WorldEvent::now(WorldEventKind::System, GIVE_UP_MESSAGE));
            return false;
        }

        let delay = self.backoff_delay(retry_count);
        self.inner.store.push_world_event(WorldEvent::now(
            WorldEventKind::Narrative,
            narrative::reconnect_narrative(retry_count),
        ));

        let inner = Arc::clone(&self.inner);
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let attempt = inner.retry_count.fetch_add(1, Ordering::SeqCst) + 1;
            if let Err(err) = inner.connection.connect(None).await {
                telemetry::log_error(
                    "ws.reconnect.failed",
                    &err,
                    log_fields! {
                        "phase" => "ws_connect",
                        "reconnect_attempt" => attempt,
                        "error_kind" => err.kind(),
                    },
                );
            }
        });

        // One pending timer at a time.
        if let Some(previous) = self.set_timer(timer) {
            previous.abort();
        }
        true
    }

    /// Cancel any pending attempt and reset the retry counter
    ///
    /// Called whenever the session reaches a state that invalidates the
    /// pending retry: connected again, logged out, or intentionally
    /// disconnected.
    pub fn stop_reconnect(&self) {
        if let Some(timer) = self.take_timer() {
            timer.abort();
        }
        self.inner.retry_count.store(0, Ordering::SeqCst);
    }

    fn set_timer(&self, timer: JoinHandle<()>) -> Option<JoinHandle<()>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .replace(timer)
    }

    fn take_timer(&self) -> Option<JoinHandle<()>> {
        self.inner
            .timer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Storage;
    use crate::telemetry::TraceContext;

    fn test_policy(initial_delay: Duration, max_retries: u32) -> (ReconnectPolicy, Arc<GameStore>) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Arc::new(Storage::open(dir.path().join("storage.json")));
        storage.set(crate::storage::TOKEN_KEY, "token-1");
        // Port 1 on loopback refuses immediately.
        let connection = ConnectionManager::new(
            "ws://127.0.0.1:1/ws",
            Duration::from_secs(30),
            storage,
            TraceContext::new(),
        );
        let store = Arc::new(GameStore::new());
        let policy = ReconnectPolicy::new(
            connection,
            Arc::clone(&store),
            initial_delay,
            Duration::from_millis(30000),
            max_retries,
        );
        (policy, store)
    }

    #[tokio::test]
    async fn test_backoff_delays_follow_schedule() {
        let (policy, _store) = test_policy(Duration::from_millis(1000), 5);
        let delays: Vec<u64> = (0..5)
            .map(|retry| policy.backoff_delay(retry).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![1000, 2000, 4000, 8000, 16000]);
        // Capped past the ceiling of the doubling curve.
        assert_eq!(policy.backoff_delay(5).as_millis(), 30000);
        assert_eq!(policy.backoff_delay(10).as_millis(), 30000);
    }

    #[tokio::test]
    async fn test_give_up_at_ceiling_emits_persistent_event() {
        let (policy, store) = test_policy(Duration::from_millis(1), 0);
        assert!(!policy.start_reconnect());

        let events = store.world_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, WorldEventKind::System);
        assert_eq!(events[0].content, GIVE_UP_MESSAGE);
    }

    #[tokio::test]
    async fn test_scheduled_attempt_increments_counter() {
        let (policy, store) = test_policy(Duration::from_millis(1), 5);
        assert!(policy.start_reconnect());
        assert_eq!(store.world_events().len(), 1);
        assert_eq!(store.world_events()[0].kind, WorldEventKind::Narrative);

        // The timer fires, the attempt fails against the dead endpoint, and
        // the counter records the attempt.
        for _ in 0..200 {
            if policy.retry_count() == 1 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(policy.retry_count(), 1);
    }

    #[tokio::test]
    async fn test_sixth_disconnect_schedules_nothing() {
        let (policy, store) = test_policy(Duration::from_millis(1), 5);

        // Five consecutive drops each schedule an attempt that fails
        // against the dead endpoint.
        for round in 0..5 {
            assert!(policy.start_reconnect());
            for _ in 0..200 {
                if policy.retry_count() == round + 1 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            assert_eq!(policy.retry_count(), round + 1);
        }

        // The sixth drop gives up instead of scheduling.
        let events_before = store.world_events().len();
        assert!(!policy.start_reconnect());
        assert_eq!(policy.retry_count(), 5);

        let events = store.world_events();
        assert_eq!(events.len(), events_before + 1);
        assert_eq!(events.last().unwrap().kind, WorldEventKind::System);
        assert_eq!(events.last().unwrap().content, GIVE_UP_MESSAGE);
    }

    #[tokio::test]
    async fn test_stop_reconnect_cancels_and_resets() {
        let (policy, _store) = test_policy(Duration::from_millis(50), 5);
        assert!(policy.start_reconnect());
        policy.stop_reconnect();
        assert_eq!(policy.retry_count(), 0);

        // The cancelled timer never fires.
        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(policy.retry_count(), 0);
    }
}
