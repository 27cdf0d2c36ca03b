//! Store observers.
//!
//! Stores never own their observers: registries keep `Weak` references,
//! skip observers that have been dropped and prune them on the next dispatch.

use std::sync::{Arc, Mutex, Weak};

use super::NotificationStore;

/// Observer of the loaded collection.
pub trait ContentObserver: Send + Sync {
    /// The collection was replaced by a refresh.
    fn store_reloaded(&self, store: &NotificationStore);

    fn notifications_inserted(&self, store: &NotificationStore, indexes: &[usize]);

    fn notifications_changed(&self, store: &NotificationStore, indexes: &[usize]);

    /// Indexes refer to positions before the removal.
    fn notifications_deleted(&self, store: &NotificationStore, indexes: &[usize]);

    fn has_next_page_changed(&self, _store: &NotificationStore, _has_next_page: bool) {}
}

/// Observer of the aggregate counters.
pub trait CountObserver: Send + Sync {
    fn total_count_changed(&self, store: &NotificationStore, count: usize);

    fn unread_count_changed(&self, store: &NotificationStore, count: usize);

    fn unseen_count_changed(&self, store: &NotificationStore, count: usize);
}

/// Set of weakly held observers, deduplicated by identity.
pub struct ObserverSet<T: ?Sized> {
    entries: Mutex<Vec<Weak<T>>>,
}

impl<T: ?Sized> Default for ObserverSet<T> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

fn same_target<T: ?Sized>(weak: &Weak<T>, observer: &Arc<T>) -> bool {
    weak.as_ptr() as *const () == Arc::as_ptr(observer) as *const ()
}

impl<T: ?Sized> ObserverSet<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer`. Returns false if it was already registered.
    pub fn add(&self, observer: &Arc<T>) -> bool {
        let mut entries = self.entries.lock().unwrap();
        entries.retain(|w| w.strong_count() > 0);
        if entries.iter().any(|w| same_target(w, observer)) {
            return false;
        }
        entries.push(Arc::downgrade(observer));
        true
    }

    /// Unregisters `observer`. Returns false if it was not registered.
    pub fn remove(&self, observer: &Arc<T>) -> bool {
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|w| !same_target(w, observer));
        entries.len() != before
    }

    /// Number of registered observers that are still alive.
    pub fn len(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        entries.iter().filter(|w| w.strong_count() > 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upgrades every live observer and drops the dead ones.
    fn live(&self) -> Vec<Arc<T>> {
        let mut entries = self.entries.lock().unwrap();
        let mut live = Vec::with_capacity(entries.len());
        entries.retain(|w| match w.upgrade() {
            Some(observer) => {
                live.push(observer);
                true
            }
            None => false,
        });
        live
    }

    /// Calls `f` for every live observer.
    ///
    /// The registry lock is released before the first call, so observers may
    /// add or remove observers from inside the callback.
    pub fn for_each(&self, mut f: impl FnMut(&T)) {
        for observer in self.live() {
            f(&observer);
        }
    }
}
