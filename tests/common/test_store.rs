use std::sync::Arc;

use notification_store::config::{PaginationStyle, StoreConfig, UnarchivePolicy};
use notification_store::{
    InMemoryNotificationBackend, Notification, NotificationStore, RemoteCollaborators,
    StorePredicate,
};

use super::RecordingObserver;

/// A store, the backend behind it and an observer registered for both roles.
pub struct TestStore {
    pub store: Arc<NotificationStore>,
    pub backend: Arc<InMemoryNotificationBackend>,
    pub observer: Arc<RecordingObserver>,
}

impl TestStore {
    pub fn new(predicate: StorePredicate, dataset: Vec<Notification>) -> Self {
        Self::with_config(predicate, dataset, StoreConfig::default())
    }

    pub fn paged(
        predicate: StorePredicate,
        dataset: Vec<Notification>,
        pagination: PaginationStyle,
        page_size: usize,
    ) -> Self {
        let config = StoreConfig {
            page_size,
            pagination,
            ..StoreConfig::default()
        };
        Self::with_config(predicate, dataset, config)
    }

    #[allow(dead_code)]
    pub fn with_unarchive_policy(
        predicate: StorePredicate,
        dataset: Vec<Notification>,
        unarchive_policy: UnarchivePolicy,
    ) -> Self {
        let config = StoreConfig {
            unarchive_policy,
            ..StoreConfig::default()
        };
        Self::with_config(predicate, dataset, config)
    }

    pub fn with_config(
        predicate: StorePredicate,
        dataset: Vec<Notification>,
        config: StoreConfig,
    ) -> Self {
        let backend = Arc::new(InMemoryNotificationBackend::new(dataset));
        let store = Arc::new(NotificationStore::new(
            "test",
            predicate,
            config,
            RemoteCollaborators::from_backend(backend.clone()),
        ));
        let observer = Arc::new(RecordingObserver::default());
        store.add_content_observer(&observer);
        store.add_count_observer(&observer);
        Self {
            store,
            backend,
            observer,
        }
    }

    /// Refreshes, then forgets the calls and events the refresh produced.
    pub async fn loaded(self) -> Self {
        self.store.refresh().await.unwrap();
        self.reset_recordings();
        self
    }

    pub fn reset_recordings(&self) {
        self.backend.clear_calls();
        self.observer.clear();
    }
}
