use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use futures::future::join_all;
use tracing::{debug, warn};

use crate::config::StoreConfig;
use crate::notifications::StorePredicate;
use crate::remote::RemoteCollaborators;
use crate::store::{NotificationStore, StoreError};

use super::RealtimeEvent;

/// Hands out one store per predicate and fans realtime events out to them.
///
/// Stores are held weakly: the director never keeps a store alive on its
/// own, and a released store is rebuilt empty on the next request.
pub struct StoreDirector {
    remote: RemoteCollaborators,
    config: StoreConfig,
    stores: Mutex<HashMap<StorePredicate, Weak<NotificationStore>>>,
}

impl StoreDirector {
    pub fn new(remote: RemoteCollaborators, config: StoreConfig) -> Self {
        Self {
            remote,
            config,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the live store for `predicate`, building it if needed.
    pub fn with_predicate(&self, predicate: StorePredicate) -> Arc<NotificationStore> {
        let mut stores = self.stores.lock().unwrap();
        if let Some(store) = stores.get(&predicate).and_then(Weak::upgrade) {
            return store;
        }

        debug!("Building store for {}", predicate);
        let store = Arc::new(NotificationStore::new(
            predicate.to_string(),
            predicate.clone(),
            self.config.clone(),
            self.remote.clone(),
        ));
        stores.insert(predicate, Arc::downgrade(&store));
        store
    }

    /// Stores that are still referenced somewhere. Released ones are pruned.
    pub fn live_stores(&self) -> Vec<Arc<NotificationStore>> {
        let mut stores = self.stores.lock().unwrap();
        stores.retain(|_, store| store.strong_count() > 0);
        stores.values().filter_map(Weak::upgrade).collect()
    }

    /// Applies `event` to every live store concurrently.
    ///
    /// Returns the name and error of every store that failed to apply it.
    /// A failure in one store does not affect the others.
    pub async fn dispatch(&self, event: &RealtimeEvent) -> Vec<(String, StoreError)> {
        let stores = self.live_stores();
        debug!(
            "Dispatching {} to {} stores",
            event.event_type(),
            stores.len()
        );

        let results = join_all(
            stores
                .iter()
                .map(|store| async move { (store.name(), store.apply_realtime_event(event).await) }),
        )
        .await;

        results
            .into_iter()
            .filter_map(|(name, result)| match result {
                Ok(()) => None,
                Err(e) => {
                    warn!("Store {} failed to apply {}: {}", name, event.event_type(), e);
                    Some((name.to_string(), e))
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::{Notification, ReadFilter};
    use crate::remote::InMemoryNotificationBackend;

    fn director() -> (StoreDirector, Arc<InMemoryNotificationBackend>) {
        let backend = Arc::new(InMemoryNotificationBackend::new(vec![
            Notification::new("a", "Title", 1700000100),
            Notification::new("b", "Title", 1700000000),
        ]));
        let director = StoreDirector::new(
            RemoteCollaborators::from_backend(backend.clone()),
            StoreConfig::default(),
        );
        (director, backend)
    }

    #[test]
    fn test_equal_predicates_share_a_store() {
        let (director, _backend) = director();

        let first = director.with_predicate(StorePredicate::new().with_categories(["billing"]));
        let second = director.with_predicate(StorePredicate::new().with_categories(["billing"]));
        let other = director.with_predicate(StorePredicate::new());

        assert!(Arc::ptr_eq(&first, &second));
        assert!(!Arc::ptr_eq(&first, &other));
        assert_eq!(director.live_stores().len(), 2);
    }

    #[test]
    fn test_released_stores_are_pruned() {
        let (director, _backend) = director();
        let store = director.with_predicate(StorePredicate::new());
        assert_eq!(director.live_stores().len(), 1);

        drop(store);

        assert!(director.live_stores().is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_reaches_every_store() {
        let (director, backend) = director();
        let all = director.with_predicate(StorePredicate::new());
        let unread = director.with_predicate(StorePredicate::new().with_read(ReadFilter::Unread));

        let failures = director.dispatch(&RealtimeEvent::Reload).await;

        assert!(failures.is_empty());
        assert_eq!(backend.fetch_count(), 2);
        assert_eq!(all.len(), 2);
        assert_eq!(unread.len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_reports_failing_store() {
        let (director, backend) = director();
        let store = director.with_predicate(StorePredicate::new());
        backend.fail_next_call("offline");

        let failures = director.dispatch(&RealtimeEvent::Reload).await;

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, store.name());
        assert!(matches!(failures[0].1, StoreError::Remote(_)));
    }
}
