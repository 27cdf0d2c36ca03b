use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Notify;

use notification_store::notifications::{StorePage, StorePredicate};
use notification_store::remote::{InMemoryNotificationBackend, StorePageFetcher};
use notification_store::store::PageRequest;

/// Fetcher that holds every request until the test releases it.
pub struct GatedFetcher {
    inner: Arc<InMemoryNotificationBackend>,
    started: Notify,
    release: Notify,
}

impl GatedFetcher {
    pub fn new(inner: Arc<InMemoryNotificationBackend>) -> Self {
        Self {
            inner,
            started: Notify::new(),
            release: Notify::new(),
        }
    }

    /// Resolves once a request is waiting at the gate.
    pub async fn wait_for_request(&self) {
        self.started.notified().await;
    }

    pub fn release_one(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl StorePageFetcher for GatedFetcher {
    async fn fetch_page(&self, predicate: &StorePredicate, request: &PageRequest) -> Result<StorePage> {
        self.started.notify_one();
        self.release.notified().await;
        self.inner.fetch_page(predicate, request).await
    }
}
