//! Subscription registry.

use super::listener::{SharedListener, SubscriptionId};
use crate::types::PropertiesChanged;
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Internal subscription state.
struct Subscription {
    /// Override keys of the subscribed flags.
    keys: BTreeSet<String>,
    listener: SharedListener,
}

impl Subscription {
    /// Check if any subscribed override key is among the changed keys.
    fn matches(&self, event: &PropertiesChanged) -> bool {
        if self.keys.len() <= event.keys.len() {
            self.keys.iter().any(|key| event.contains(key))
        } else {
            event.keys.iter().any(|key| self.keys.contains(key))
        }
    }
}

/// Flag subscriptions in registration order.
pub(crate) struct SubscriptionRegistry {
    /// Active subscriptions by ID. IDs are monotonic, so iteration follows
    /// registration order.
    subscriptions: RwLock<BTreeMap<SubscriptionId, Subscription>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
}

impl SubscriptionRegistry {
    pub(crate) fn new() -> Self {
        Self {
            subscriptions: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub(crate) fn subscribe(
        &self,
        keys: BTreeSet<String>,
        listener: SharedListener,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.subscriptions
            .write()
            .insert(id, Subscription { keys, listener });
        id
    }

    pub(crate) fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscriptions.write().remove(&id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscriptions.read().len()
    }

    /// Listeners to notify for `event`, each at most once, ordered by their
    /// first matching subscription.
    pub(crate) fn listeners_for(&self, event: &PropertiesChanged) -> Vec<SharedListener> {
        let subs = self.subscriptions.read();
        let mut seen = HashSet::new();
        let mut listeners = Vec::new();

        for sub in subs.values() {
            if !sub.matches(event) {
                continue;
            }
            // Compare data pointers only; vtable pointers may differ per crate.
            let identity = Arc::as_ptr(&sub.listener) as *const ();
            if seen.insert(identity) {
                listeners.push(Arc::clone(&sub.listener));
            }
        }

        listeners
    }
}
