//! # Server Flags
//!
//! Watches a remotely managed configuration namespace for server overrides
//! of feature flags and tells interested code when they change.
//!
//! ## Core Concepts
//!
//! - **Flags**: Identified by a stable id, overridden by the store key
//!   `flag_override_<id>`
//! - **Proxy**: The namespaced key/value store, consumed through a trait
//! - **Executor**: A sequential task runner on which listeners are notified
//! - **Reader**: Bridges store callbacks (any thread) to listener
//!   notification (executor only)
//!
//! ## Example
//!
//! ```ignore
//! use server_flags::{Flag, InMemoryConfigProxy, ManualExecutor, ServerFlagReader};
//!
//! let proxy = Arc::new(InMemoryConfigProxy::new());
//! let executor = Arc::new(ManualExecutor::new());
//! let reader = ServerFlagReader::new("systemui", proxy.clone(), executor.clone())?;
//!
//! let flag = Flag::unreleased(1);
//! reader.listen_for_changes(&[flag.clone()], Arc::new(|| println!("flags changed")))?;
//!
//! proxy.set_property("systemui", "flag_override_1", "1", false)?;
//! executor.run_all_ready(); // listener runs here
//! assert!(reader.is_enabled(&flag));
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod proxy;
pub mod reader;
pub mod types;

// Re-exports
pub use config::ReaderConfig;
pub use error::{FlagError, Result};
pub use executor::{DirectExecutor, Executor, ManualExecutor, SerialExecutor, Task};
pub use proxy::{ConfigNamespaceProxy, InMemoryConfigProxy, ListenerId, PropertiesChangedCallback};
pub use reader::{ChangeListener, ServerFlagReader, SharedListener, SubscriptionId};
pub use types::*;
