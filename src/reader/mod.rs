//! Flag override watching.
//!
//! A [`ServerFlagReader`] is bound to one namespace of a config store. It
//! keeps a registry of (flags → listener) subscriptions and, whenever the
//! store reports changed keys in its namespace, notifies the listeners whose
//! flags' override keys are among them:
//! - Notification happens on the reader's executor, never on the store's
//!   callback thread
//! - Each listener is called at most once per store change
//! - Changes to unrelated keys notify nobody
//!
//! # Example
//!
//! ```ignore
//! let reader = ServerFlagReader::new("systemui", proxy, executor)?;
//! let flag = Flag::released(1);
//!
//! reader.listen_for_changes(&[flag.clone()], Arc::new(|| println!("re-check flags")))?;
//! proxy.set_property("systemui", "flag_override_1", "0", false)?;
//!
//! executor.run_all_ready();
//! assert!(!reader.is_enabled(&flag));
//! ```

mod flag_reader;
mod listener;
mod registry;

pub use flag_reader::ServerFlagReader;
pub use listener::{ChangeListener, SharedListener, SubscriptionId};
