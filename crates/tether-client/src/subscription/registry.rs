//! Subscription registry
//!
//! Holds the subscriber set and fans events out to it. Fan-out iterates a
//! snapshot taken before the first callback runs, so callbacks may
//! subscribe or unsubscribe without disturbing the delivery in progress.

use super::Subscriber;
use parking_lot::RwLock;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// Registry-assigned subscriber id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

struct Entry {
    id: SubscriberId,
    subscriber: Arc<dyn Subscriber>,
}

#[derive(Default)]
struct RegistryInner {
    entries: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl RegistryInner {
    fn remove(&self, id: SubscriberId) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        before != entries.len()
    }
}

/// Ordered set of subscribers
///
/// Cloning yields another handle to the same set.
#[derive(Clone, Default)]
pub struct SubscriptionRegistry {
    inner: Arc<RegistryInner>,
}

impl SubscriptionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber
    ///
    /// Adding the same `Arc` twice keeps a single entry; both guards then
    /// refer to it and either one removes it.
    pub fn add(&self, subscriber: Arc<dyn Subscriber>) -> Subscription {
        let mut entries = self.inner.entries.write();

        let id = match find_entry(&entries, &subscriber) {
            Some(id) => {
                tracing::debug!(subscriber_id = %id, "Subscriber already registered");
                id
            }
            None => {
                let id = SubscriberId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
                entries.push(Entry { id, subscriber });
                tracing::debug!(subscriber_id = %id, total = entries.len(), "Subscriber added");
                id
            }
        };

        Subscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Get the id under which `subscriber` is registered
    #[must_use]
    pub fn find(&self, subscriber: &Arc<dyn Subscriber>) -> Option<SubscriberId> {
        find_entry(&self.inner.entries.read(), subscriber)
    }

    /// Remove a subscriber by id
    ///
    /// Returns false if it was not registered.
    pub fn remove(&self, id: SubscriberId) -> bool {
        let removed = self.inner.remove(id);
        if removed {
            tracing::debug!(subscriber_id = %id, "Subscriber removed");
        }
        removed
    }

    /// Get the number of subscribers
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.entries.read().is_empty()
    }

    /// Check if a subscriber is registered
    #[must_use]
    pub fn contains(&self, id: SubscriberId) -> bool {
        self.inner.entries.read().iter().any(|entry| entry.id == id)
    }

    /// Get the current subscribers in insertion order
    #[must_use]
    pub fn snapshot(&self) -> Vec<Arc<dyn Subscriber>> {
        self.inner
            .entries
            .read()
            .iter()
            .map(|entry| entry.subscriber.clone())
            .collect()
    }

    /// Invoke `f` on every current subscriber
    ///
    /// Returns the number of callbacks that completed without panicking.
    pub fn broadcast(&self, f: impl Fn(&dyn Subscriber)) -> usize {
        deliver(&self.snapshot(), f)
    }
}

impl std::fmt::Debug for SubscriptionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionRegistry")
            .field("subscribers", &self.len())
            .finish()
    }
}

fn find_entry(entries: &[Entry], subscriber: &Arc<dyn Subscriber>) -> Option<SubscriberId> {
    entries
        .iter()
        .find(|entry| std::ptr::addr_eq(Arc::as_ptr(&entry.subscriber), Arc::as_ptr(subscriber)))
        .map(|entry| entry.id)
}

/// Invoke `f` on each of `targets`, isolating panics per subscriber
pub(crate) fn deliver(targets: &[Arc<dyn Subscriber>], f: impl Fn(&dyn Subscriber)) -> usize {
    let mut delivered = 0;

    for (index, subscriber) in targets.iter().enumerate() {
        match catch_unwind(AssertUnwindSafe(|| f(subscriber.as_ref()))) {
            Ok(()) => delivered += 1,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(ToString::to_string)
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_default();
                tracing::error!(position = index, panic = %message, "Subscriber callback panicked");
            }
        }
    }

    delivered
}

/// Registration guard
///
/// Dropping the guard unsubscribes. `unsubscribe` does the same explicitly
/// and may be called any number of times.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriberId,
    registry: Weak<RegistryInner>,
}

impl Subscription {
    /// Get the subscriber id
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the subscriber from the registry
    ///
    /// Returns false if it was already gone.
    pub fn unsubscribe(&self) -> bool {
        let removed = self
            .registry
            .upgrade()
            .is_some_and(|registry| registry.remove(self.id));
        if removed {
            tracing::debug!(subscriber_id = %self.id, "Unsubscribed");
        }
        removed
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
