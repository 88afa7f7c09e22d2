//! Listener types.

use std::fmt;
use std::sync::Arc;

/// Signal that some flag a listener cares about changed.
///
/// Carries no payload; implementations re-read the flags they need.
/// Implementations should be cheap and idempotent and must not panic.
pub trait ChangeListener: Send + Sync {
    fn on_change(&self);
}

impl<F> ChangeListener for F
where
    F: Fn() + Send + Sync,
{
    fn on_change(&self) {
        self()
    }
}

/// Shared listener handle. Identity is the allocation, so registering clones
/// of one `Arc` counts as the same listener.
pub type SharedListener = Arc<dyn ChangeListener>;

/// Unique identifier for a subscription.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
