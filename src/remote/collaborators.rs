//! Remote collaborator contracts.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::notifications::{StorePage, StorePredicate};
use crate::store::PageRequest;

/// Status actions the server can apply to notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAction {
    MarkAsRead,
    MarkAsUnread,
    Archive,
    Unarchive,
    MarkAllAsRead,
    MarkAllAsSeen,
}

impl NotificationAction {
    /// Whether the action targets every notification instead of one id.
    pub fn is_bulk(self) -> bool {
        matches!(
            self,
            NotificationAction::MarkAllAsRead | NotificationAction::MarkAllAsSeen
        )
    }
}

/// Fetches one page of notifications matching a predicate.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait StorePageFetcher: Send + Sync {
    async fn fetch_page(&self, predicate: &StorePredicate, request: &PageRequest)
        -> Result<StorePage>;
}

/// Applies a status action on the server.
///
/// `notification_id` is `None` for bulk actions.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait NotificationActions: Send + Sync {
    async fn perform(&self, action: NotificationAction, notification_id: Option<String>) -> Result<()>;
}

/// Deletes a notification on the server.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait NotificationDeleter: Send + Sync {
    async fn delete(&self, notification_id: &str) -> Result<()>;
}

/// The three collaborators a store is built with.
#[derive(Clone)]
pub struct RemoteCollaborators {
    pub fetcher: Arc<dyn StorePageFetcher>,
    pub actions: Arc<dyn NotificationActions>,
    pub deleter: Arc<dyn NotificationDeleter>,
}

impl RemoteCollaborators {
    pub fn new(
        fetcher: Arc<dyn StorePageFetcher>,
        actions: Arc<dyn NotificationActions>,
        deleter: Arc<dyn NotificationDeleter>,
    ) -> Self {
        Self {
            fetcher,
            actions,
            deleter,
        }
    }

    /// Uses a single backend for all three contracts.
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: StorePageFetcher + NotificationActions + NotificationDeleter + 'static,
    {
        Self {
            fetcher: backend.clone(),
            actions: backend.clone(),
            deleter: backend,
        }
    }
}
