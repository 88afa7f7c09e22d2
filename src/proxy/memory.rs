//! In-memory config store.

use super::{ConfigNamespaceProxy, ListenerId, PropertiesChangedCallback};
use crate::error::{FlagError, Result};
use crate::executor::Executor;
use crate::types::PropertiesChanged;
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A stored value and the default it resets to.
#[derive(Clone, Debug, Default)]
struct Entry {
    value: Option<String>,
    default: Option<String>,
}

/// A registered change callback.
struct Registration {
    namespace: String,
    executor: Arc<dyn Executor>,
    callback: PropertiesChangedCallback,
}

/// Thread-safe in-process [`ConfigNamespaceProxy`].
///
/// Callbacks are posted to their executor on the thread that performed the
/// write, after all internal locks are released. Writes that leave a value
/// unchanged fire nothing.
pub struct InMemoryConfigProxy {
    /// Entries by namespace, then key.
    namespaces: RwLock<HashMap<String, HashMap<String, Entry>>>,
    /// Registered callbacks by ID.
    listeners: RwLock<HashMap<ListenerId, Registration>>,
    /// Counter for generating listener IDs.
    next_id: AtomicU64,
    /// When false every operation fails with `StoreUnavailable`.
    available: AtomicBool,
}

impl InMemoryConfigProxy {
    pub fn new() -> Self {
        Self {
            namespaces: RwLock::new(HashMap::new()),
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate the store going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Number of registered change callbacks.
    pub fn listener_count(&self) -> usize {
        self.listeners.read().len()
    }

    /// Write several keys at once; listeners see a single change event.
    pub fn set_properties<I, K, V>(&self, namespace: &str, properties: I) -> Result<bool>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.check_available()?;

        let mut changed = BTreeSet::new();
        {
            let mut namespaces = self.namespaces.write();
            let entries = namespaces.entry(namespace.to_string()).or_default();
            for (key, value) in properties {
                let key = key.into();
                let value = value.into();
                let entry = entries.entry(key.clone()).or_default();
                if entry.value.as_deref() != Some(value.as_str()) {
                    entry.value = Some(value);
                    changed.insert(key);
                }
            }
        }

        self.notify(namespace, changed);
        Ok(true)
    }

    /// Restore every key of `namespace` to its default, dropping keys that
    /// have none.
    pub fn reset_to_defaults(&self, namespace: &str) -> Result<()> {
        self.check_available()?;

        let mut changed = BTreeSet::new();
        {
            let mut namespaces = self.namespaces.write();
            if let Some(entries) = namespaces.get_mut(namespace) {
                for (key, entry) in entries.iter_mut() {
                    if entry.value != entry.default {
                        entry.value = entry.default.clone();
                        changed.insert(key.clone());
                    }
                }
                entries.retain(|_, entry| entry.value.is_some() || entry.default.is_some());
            }
        }

        self.notify(namespace, changed);
        Ok(())
    }

    fn check_available(&self) -> Result<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(FlagError::StoreUnavailable(
                "in-memory store disabled".to_string(),
            ))
        }
    }

    /// Post a change event to every callback registered for `namespace`.
    fn notify(&self, namespace: &str, keys: BTreeSet<String>) {
        if keys.is_empty() {
            return;
        }

        let event = PropertiesChanged {
            namespace: namespace.to_string(),
            keys,
        };

        // Snapshot so callbacks may (un)register without deadlocking.
        let targets: Vec<(Arc<dyn Executor>, PropertiesChangedCallback)> = {
            let listeners = self.listeners.read();
            let mut targets: Vec<_> = listeners
                .iter()
                .filter(|(_, reg)| reg.namespace == namespace)
                .map(|(id, reg)| (*id, Arc::clone(&reg.executor), Arc::clone(&reg.callback)))
                .collect();
            targets.sort_by_key(|(id, _, _)| *id);
            targets
                .into_iter()
                .map(|(_, executor, callback)| (executor, callback))
                .collect()
        };

        for (executor, callback) in targets {
            let event = event.clone();
            if let Err(e) = executor.execute(Box::new(move || callback(&event))) {
                tracing::warn!(namespace, error = %e, "dropping change callback");
            }
        }
    }
}

impl Default for InMemoryConfigProxy {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigNamespaceProxy for InMemoryConfigProxy {
    fn get_property(&self, namespace: &str, key: &str) -> Result<Option<String>> {
        self.check_available()?;

        let namespaces = self.namespaces.read();
        Ok(namespaces
            .get(namespace)
            .and_then(|entries| entries.get(key))
            .and_then(|entry| entry.value.clone()))
    }

    fn set_property(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        make_default: bool,
    ) -> Result<bool> {
        self.check_available()?;

        let changed = {
            let mut namespaces = self.namespaces.write();
            let entry = namespaces
                .entry(namespace.to_string())
                .or_default()
                .entry(key.to_string())
                .or_default();
            if make_default {
                entry.default = Some(value.to_string());
            }
            if entry.value.as_deref() == Some(value) {
                false
            } else {
                entry.value = Some(value.to_string());
                true
            }
        };

        if changed {
            self.notify(namespace, BTreeSet::from([key.to_string()]));
        }
        Ok(true)
    }

    fn delete_property(&self, namespace: &str, key: &str) -> Result<bool> {
        self.check_available()?;

        let removed = {
            let mut namespaces = self.namespaces.write();
            let Some(entries) = namespaces.get_mut(namespace) else {
                return Ok(false);
            };
            // The recorded default outlives the value so a later reset can
            // restore it.
            let keeps_default = entries.get(key).map_or(false, |entry| entry.default.is_some());
            if keeps_default {
                entries
                    .get_mut(key)
                    .map_or(false, |entry| entry.value.take().is_some())
            } else {
                entries.remove(key).map_or(false, |entry| entry.value.is_some())
            }
        };

        if removed {
            self.notify(namespace, BTreeSet::from([key.to_string()]));
        }
        Ok(removed)
    }

    fn add_on_properties_changed_listener(
        &self,
        namespace: &str,
        executor: Arc<dyn Executor>,
        callback: PropertiesChangedCallback,
    ) -> Result<ListenerId> {
        self.check_available()?;

        let id = ListenerId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.listeners.write().insert(
            id,
            Registration {
                namespace: namespace.to_string(),
                executor,
                callback,
            },
        );
        tracing::debug!(namespace, listener = id.0, "registered change callback");
        Ok(id)
    }

    fn remove_on_properties_changed_listener(&self, id: ListenerId) -> bool {
        self.listeners.write().remove(&id).is_some()
    }
}

impl fmt::Debug for InMemoryConfigProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryConfigProxy")
            .field("namespaces", &self.namespaces.read().len())
            .field("listeners", &self.listener_count())
            .field("available", &self.available.load(Ordering::SeqCst))
            .finish()
    }
}
