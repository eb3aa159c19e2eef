//! Synchronous change notification shared by every memory block.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use super::{read_lock, write_lock};

/// One mutation of a storage cell, published before the mutating call returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ChangeEvent<L, V> {
    /// Cell that was written.
    pub location: L,
    /// Value before the write.
    pub old: V,
    /// Value after the write.
    pub new: V,
}

impl<L, V> ChangeEvent<L, V> {
    /// Builds an event.
    pub const fn new(location: L, old: V, new: V) -> Self {
        Self { location, old, new }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Callback registered for change events.
pub type Listener<L, V> = Arc<dyn Fn(&ChangeEvent<L, V>) + Send + Sync>;

/// Ordered list of listeners for one block.
pub struct Observers<L, V> {
    next_id: AtomicU64,
    listeners: RwLock<Vec<(SubscriptionId, Listener<L, V>)>>,
}

impl<L, V> Default for Observers<L, V> {
    fn default() -> Self {
        Self {
            next_id: AtomicU64::new(0),
            listeners: RwLock::new(Vec::new()),
        }
    }
}

impl<L, V> std::fmt::Debug for Observers<L, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("listeners", &self.len())
            .finish()
    }
}

impl<L, V> Observers<L, V> {
    /// Registers a listener; events are delivered in registration order.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent<L, V>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        write_lock(&self.listeners).push((id, Arc::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` if `id` was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = write_lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|(entry, _)| *entry != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock(&self.listeners).len()
    }

    /// Returns `true` when nobody is listening.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers `events` to every listener.
    ///
    /// The listener list is cloned first so a callback may subscribe,
    /// unsubscribe or read the block that emitted the event.
    pub fn notify_all(&self, events: &[ChangeEvent<L, V>]) {
        if events.is_empty() {
            return;
        }
        let listeners: Vec<Listener<L, V>> = read_lock(&self.listeners)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for event in events {
            for listener in &listeners {
                listener(event);
            }
        }
    }

    /// Delivers a single event.
    pub fn notify(&self, event: ChangeEvent<L, V>) {
        self.notify_all(std::slice::from_ref(&event));
    }
}

/// Blocks that publish [`ChangeEvent`]s.
pub trait Observable {
    /// Cell identifier carried by events.
    type Location;
    /// Cell value carried by events.
    type Value;

    /// Listener registry of this block.
    fn observers(&self) -> &Observers<Self::Location, Self::Value>;

    /// Registers a listener for every subsequent mutation.
    fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent<Self::Location, Self::Value>) + Send + Sync + 'static,
    {
        self.observers().subscribe(listener)
    }

    /// Removes a listener. Returns `false` if `id` was not registered.
    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.observers().unsubscribe(id)
    }
}
