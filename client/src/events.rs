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

//! Subscriber registries for connection events
//!
//! A [`Registry`] fans one value out to every registered handler in
//! registration order. Emission iterates a snapshot of the handler list, so
//! a handler that unsubscribes another (or itself) mid-dispatch cannot
//! corrupt the iteration.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;
type HandlerList<T> = Mutex<Vec<(u64, Handler<T>)>>;

/// Ordered fan-out list of event handlers
pub struct Registry<T> {
    handlers: Arc<HandlerList<T>>,
    next_id: AtomicU64,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            handlers: Arc::new(Mutex::new(Vec::new())),
            next_id: AtomicU64::new(0),
        }
    }
}

impl<T: 'static> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, returning its unregistration handle
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(handler)));

        let handlers: Weak<HandlerList<T>> = Arc::downgrade(&self.handlers);
        Subscription {
            cancel: Some(Box::new(move || {
                if let Some(handlers) = handlers.upgrade() {
                    handlers
                        .lock()
                        .unwrap_or_else(|e| e.into_inner())
                        .retain(|(entry_id, _)| *entry_id != id);
                }
            })),
        }
    }

    /// Invoke every handler, in registration order
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Handler<T>> =
            self.lock().iter().map(|(_, handler)| Arc::clone(handler)).collect();
        for handler in snapshot {
            handler(value);
        }
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(u64, Handler<T>)>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Handle that removes its handler from the registry
///
/// Dropping the handle without calling [`Subscription::unsubscribe`] leaves
/// the handler registered for the registry's lifetime.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Remove the handler from its registry
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_handlers_run_in_registration_order() {
        let registry: Registry<u32> = Registry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for index in 0..3 {
            let order = Arc::clone(&order);
            // Leak the subscription; the handler stays registered.
            let _ = registry.subscribe(move |value: &u32| {
                order.lock().unwrap().push((index, *value));
            });
        }

        registry.emit(&7);
        let seen = order.lock().unwrap().clone();
        assert_eq!(seen, vec![(0, 7), (1, 7), (2, 7)]);
    }

    #[test]
    fn test_unsubscribe_removes_handler() {
        let registry: Registry<u32> = Registry::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        let subscription = registry.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(registry.len(), 1);

        registry.emit(&1);
        subscription.unsubscribe();
        registry.emit(&2);

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_unsubscribe_during_emit_does_not_skip() {
        // A handler unsubscribing another handler mid-dispatch still lets
        // the snapshot finish the current emission.
        let registry: Arc<Registry<u32>> = Arc::new(Registry::new());
        let count = Arc::new(AtomicUsize::new(0));

        let second = {
            let counter = Arc::clone(&count);
            registry.subscribe(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
        };
        let slot = Arc::new(Mutex::new(Some(second)));
        {
            let slot = Arc::clone(&slot);
            let counter = Arc::clone(&count);
            let _ = registry.subscribe(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                if let Some(subscription) = slot.lock().unwrap().take() {
                    subscription.unsubscribe();
                }
            });
        }

        registry.emit(&1);
        // Both handlers ran this round...
        assert_eq!(count.load(Ordering::SeqCst), 2);

        registry.emit(&2);
        // ...and only the first remains for the next.
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }
}
