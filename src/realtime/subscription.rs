//! # Subscription Management
//!
//! Registry of live subscriptions keyed by channel key.
//!
//! ## Invariants
//!
//! - At most one teardown per channel key.
//! - Every teardown handed to [`SubscriptionRegistry::add`] is invoked exactly
//!   once: on `remove`, on `remove_all`, when a newer entry replaces it, or when
//!   the registry is dropped.
//! - `count()` is the number of subscriptions the registry believes it owns.
//!   It is not verified against the transport.
//!
//! Teardowns always run outside the lock, so a teardown may call back into
//! the registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::transport::Teardown;
use crate::observability::{log_event, Event};

/// Registry of active subscriptions
#[derive(Default)]
pub struct SubscriptionRegistry {
    /// Teardowns by channel key
    entries: Mutex<HashMap<String, Teardown>>,
}

impl fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = self.keys();
        keys.sort();
        f.debug_struct("SubscriptionRegistry").field("keys", &keys).finish()
    }
}

impl SubscriptionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, Teardown>> {
        // Teardowns never run under the lock; a poisoned map is still consistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `teardown` under `key`.
    ///
    /// An existing entry for `key` is replaced and its teardown invoked.
    pub fn add(&self, key: impl Into<String>, teardown: Teardown) {
        let key = key.into();
        let previous = self.entries().insert(key.clone(), teardown);

        match previous {
            Some(previous) => {
                previous();
                log_event(Event::SubscriptionReplaced, &[("key", key.as_str())]);
            }
            None => log_event(Event::Subscribed, &[("key", key.as_str())]),
        }
    }

    /// Tear down and forget `key`. Unknown keys are a no-op.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        let teardown = self.entries().remove(key);

        match teardown {
            Some(teardown) => {
                teardown();
                log_event(Event::Unsubscribed, &[("key", key)]);
                true
            }
            None => false,
        }
    }

    /// Tear down every entry and clear the registry.
    ///
    /// Returns the number of entries removed.
    pub fn remove_all(&self) -> usize {
        let drained: Vec<(String, Teardown)> = self.entries().drain().collect();
        let removed = drained.len();

        for (_, teardown) in drained {
            teardown();
        }

        if removed > 0 {
            log_event(Event::UnsubscribedAll, &[("count", removed.to_string().as_str())]);
        }
        removed
    }

    /// Number of registered entries
    pub fn count(&self) -> usize {
        self.entries().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether `key` is registered
    pub fn contains(&self, key: &str) -> bool {
        self.entries().contains_key(key)
    }

    /// Registered keys, unordered
    pub fn keys(&self) -> Vec<String> {
        self.entries().keys().cloned().collect()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.remove_all();
    }
}
