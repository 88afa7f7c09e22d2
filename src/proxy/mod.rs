//! Access to the namespaced configuration store.
//!
//! The store itself (persistence, sync with the server, multi-process
//! access) lives outside this crate. [`ConfigNamespaceProxy`] is the
//! surface the flag reader consumes; [`InMemoryConfigProxy`] is a
//! thread-safe in-process implementation used for tests and simulation.

mod memory;

use crate::error::Result;
use crate::executor::Executor;
use crate::types::PropertiesChanged;
use std::sync::Arc;

pub use memory::InMemoryConfigProxy;

/// Callback fired with the keys that changed in one namespace.
pub type PropertiesChangedCallback = Arc<dyn Fn(&PropertiesChanged) + Send + Sync>;

/// Identifies a callback registered with a proxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Key/value store partitioned by namespace.
pub trait ConfigNamespaceProxy: Send + Sync {
    /// Current value of `key` in `namespace`, if set.
    fn get_property(&self, namespace: &str, key: &str) -> Result<Option<String>>;

    /// Write a value. With `make_default` the value also becomes the key's
    /// default. Returns whether the store accepted the write.
    fn set_property(
        &self,
        namespace: &str,
        key: &str,
        value: &str,
        make_default: bool,
    ) -> Result<bool>;

    /// Remove a key. Returns whether it was present.
    fn delete_property(&self, namespace: &str, key: &str) -> Result<bool>;

    /// Register `callback` for every change under `namespace`.
    ///
    /// The callback is handed to `executor`; which thread posts it there is
    /// up to the store.
    fn add_on_properties_changed_listener(
        &self,
        namespace: &str,
        executor: Arc<dyn Executor>,
        callback: PropertiesChangedCallback,
    ) -> Result<ListenerId>;

    /// Unregister a callback. Returns false if it was not registered.
    fn remove_on_properties_changed_listener(&self, id: ListenerId) -> bool;
}
