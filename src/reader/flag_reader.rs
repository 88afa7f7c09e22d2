//! Server flag reader.

use super::listener::{SharedListener, SubscriptionId};
use super::registry::SubscriptionRegistry;
use crate::config::ReaderConfig;
use crate::error::Result;
use crate::executor::{DirectExecutor, Executor};
use crate::proxy::{ConfigNamespaceProxy, ListenerId, PropertiesChangedCallback};
use crate::types::{override_key, parse_override, Flag, FlagId, PropertiesChanged};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Watches one store namespace for flag overrides and notifies listeners on
/// the execution context.
///
/// Store callbacks may arrive on any thread. The reader never runs listener
/// code on that thread; it posts a dispatch task to its executor instead, so
/// listeners only ever run where the executor runs them, in callback order.
pub struct ServerFlagReader {
    inner: Arc<ReaderInner>,
}

/// State shared with store callbacks and dispatch tasks, which only hold
/// weak references to it.
struct ReaderInner {
    config: ReaderConfig,
    proxy: Arc<dyn ConfigNamespaceProxy>,
    executor: Arc<dyn Executor>,
    registry: SubscriptionRegistry,
    /// Store callback, registered on first subscription.
    store_listener: Mutex<Option<ListenerId>>,
}

impl ServerFlagReader {
    /// Bind a reader to `namespace` of `proxy`, notifying on `executor`.
    pub fn new(
        namespace: impl Into<String>,
        proxy: Arc<dyn ConfigNamespaceProxy>,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        Self::with_config(ReaderConfig::new(namespace), proxy, executor)
    }

    /// Create a reader from a full configuration.
    pub fn with_config(
        config: ReaderConfig,
        proxy: Arc<dyn ConfigNamespaceProxy>,
        executor: Arc<dyn Executor>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            inner: Arc::new(ReaderInner {
                config,
                proxy,
                executor,
                registry: SubscriptionRegistry::new(),
                store_listener: Mutex::new(None),
            }),
        })
    }

    /// Namespace this reader is bound to.
    pub fn namespace(&self) -> &str {
        &self.inner.config.namespace
    }

    /// Number of active subscriptions.
    pub fn subscription_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Call `listener` whenever the override of any of `flags` changes.
    ///
    /// Registrations are additive: calling again with other flags or another
    /// listener keeps earlier subscriptions. Registering the same listener
    /// more than once still notifies it at most once per store change.
    ///
    /// The first call registers the reader's store callback; if the store
    /// rejects it, the error is returned and nothing is subscribed.
    pub fn listen_for_changes(
        &self,
        flags: &[Flag],
        listener: SharedListener,
    ) -> Result<SubscriptionId> {
        self.ensure_store_listener()?;

        let keys: BTreeSet<String> = flags.iter().map(|flag| self.override_key(flag)).collect();

        let id = self.inner.registry.subscribe(keys, listener);
        tracing::debug!(
            namespace = %self.namespace(),
            subscription = %id,
            flags = flags.len(),
            "listening for flag changes"
        );
        Ok(id)
    }

    /// Store key carrying `flag`'s override for this reader, e.g.
    /// `flag_override_7` with the default prefix.
    pub fn override_key(&self, flag: &Flag) -> String {
        override_key(&self.inner.config.override_prefix, &flag.id)
    }

    /// Drop a subscription. Returns false if it was already gone.
    pub fn remove_listener(&self, id: SubscriptionId) -> bool {
        self.inner.registry.unsubscribe(id)
    }

    /// Current value of `flag`: the server override if one is set and
    /// parseable, else the flag's default. Never fails.
    pub fn is_enabled(&self, flag: &Flag) -> bool {
        self.read_override(&flag.id).unwrap_or(flag.default)
    }

    /// The server override for `id`, if present and parseable.
    ///
    /// Store failures are logged and read as "no override".
    pub fn read_override(&self, id: &FlagId) -> Option<bool> {
        let namespace = self.namespace();
        let key = override_key(&self.inner.config.override_prefix, id);

        match self.inner.proxy.get_property(namespace, &key) {
            Ok(Some(value)) => {
                let parsed = parse_override(&value);
                if parsed.is_none() {
                    tracing::warn!(
                        namespace,
                        key = %key,
                        value = %value,
                        "ignoring unparseable override"
                    );
                }
                parsed
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(
                    namespace,
                    key = %key,
                    error = %e,
                    "override read failed, using default"
                );
                None
            }
        }
    }

    /// Register the store callback once per reader.
    fn ensure_store_listener(&self) -> Result<()> {
        let mut store_listener = self.inner.store_listener.lock();
        if store_listener.is_some() {
            return Ok(());
        }

        let weak = Arc::downgrade(&self.inner);
        let callback: PropertiesChangedCallback = Arc::new(move |event: &PropertiesChanged| {
            if let Some(inner) = weak.upgrade() {
                inner.on_properties_changed(event);
            }
        });

        // Delivered inline on whatever thread the store uses; the callback
        // itself hops onto our executor.
        let id = self.inner.proxy.add_on_properties_changed_listener(
            &self.inner.config.namespace,
            Arc::new(DirectExecutor),
            callback,
        )?;
        *store_listener = Some(id);

        tracing::debug!(
            namespace = %self.namespace(),
            listener = id.0,
            "subscribed to store changes"
        );
        Ok(())
    }
}

impl ReaderInner {
    /// Store callback. Runs on a store-owned thread, so it only posts.
    fn on_properties_changed(self: &Arc<Self>, event: &PropertiesChanged) {
        if event.namespace != self.config.namespace {
            return;
        }

        let weak = Arc::downgrade(self);
        let event = event.clone();
        let posted = self.executor.execute(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.dispatch(&event);
            }
        }));

        if let Err(e) = posted {
            tracing::warn!(
                namespace = %self.config.namespace,
                error = %e,
                "could not post flag change dispatch"
            );
        }
    }

    /// Notify every listener with a subscribed flag among the changed keys.
    /// Runs on the executor.
    fn dispatch(&self, event: &PropertiesChanged) {
        let listeners = self.registry.listeners_for(event);
        tracing::debug!(
            namespace = %self.config.namespace,
            changed = event.keys.len(),
            listeners = listeners.len(),
            "dispatching flag changes"
        );

        for (index, listener) in listeners.into_iter().enumerate() {
            tracing::trace!(namespace = %self.config.namespace, index, "notifying listener");
            if !self.config.isolate_listener_panics {
                listener.on_change();
                continue;
            }
            if panic::catch_unwind(AssertUnwindSafe(|| listener.on_change())).is_err() {
                tracing::error!(namespace = %self.config.namespace, "change listener panicked");
            }
        }
    }
}

impl Drop for ReaderInner {
    fn drop(&mut self) {
        if let Some(id) = self.store_listener.get_mut().take() {
            self.proxy.remove_on_properties_changed_listener(id);
        }
    }
}

impl fmt::Debug for ServerFlagReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerFlagReader")
            .field("namespace", &self.namespace())
            .field("subscriptions", &self.subscription_count())
            .field("subscribed", &self.inner.store_listener.lock().is_some())
            .finish()
    }
}
