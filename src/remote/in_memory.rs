//! In-memory notification backend.
//!
//! Serves a fixed, newest-first dataset through all three collaborator
//! contracts, paginating with either cursors (notification ids) or page
//! numbers. Every call is recorded so tests can assert on network traffic,
//! and the next call can be made to fail.

use std::sync::Mutex;

use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;

use crate::notifications::{Notification, PageInfo, StorePage, StorePredicate};
use crate::store::{CursorRequest, PageRequest};

use super::{NotificationAction, NotificationActions, NotificationDeleter, StorePageFetcher};

/// A call received by the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    FetchPage {
        predicate: StorePredicate,
        request: PageRequest,
    },
    Action {
        action: NotificationAction,
        notification_id: Option<String>,
    },
    Delete {
        notification_id: String,
    },
}

struct BackendState {
    /// Newest first.
    notifications: Vec<Notification>,
    calls: Vec<BackendCall>,
    fail_next: Option<String>,
}

pub struct InMemoryNotificationBackend {
    state: Mutex<BackendState>,
}

impl InMemoryNotificationBackend {
    /// Create a backend serving `notifications`, newest first.
    pub fn new(notifications: Vec<Notification>) -> Self {
        Self {
            state: Mutex::new(BackendState {
                notifications,
                calls: Vec::new(),
                fail_next: None,
            }),
        }
    }

    /// Adds a notification in front of the dataset, as a newly sent one.
    pub fn insert_newest(&self, notification: Notification) {
        self.state.lock().unwrap().notifications.insert(0, notification);
    }

    /// Replaces the stored copy of a notification, e.g. to simulate a change
    /// made by another client.
    pub fn update(&self, notification: Notification) -> bool {
        let mut state = self.state.lock().unwrap();
        match state
            .notifications
            .iter_mut()
            .find(|n| n.id == notification.id)
        {
            Some(existing) => {
                *existing = notification;
                true
            }
            None => false,
        }
    }

    /// Removes a notification without recording a call.
    pub fn remove(&self, notification_id: &str) -> Option<Notification> {
        let mut state = self.state.lock().unwrap();
        let index = state
            .notifications
            .iter()
            .position(|n| n.id == notification_id)?;
        Some(state.notifications.remove(index))
    }

    pub fn notification(&self, notification_id: &str) -> Option<Notification> {
        self.state
            .lock()
            .unwrap()
            .notifications
            .iter()
            .find(|n| n.id == notification_id)
            .cloned()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    /// Makes the next call fail with `message`.
    pub fn fail_next_call(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail_next = Some(message.into());
    }

    pub fn calls(&self) -> Vec<BackendCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn fetch_count(&self) -> usize {
        self.count_calls(|c| matches!(c, BackendCall::FetchPage { .. }))
    }

    pub fn action_count(&self) -> usize {
        self.count_calls(|c| matches!(c, BackendCall::Action { .. }))
    }

    pub fn delete_count(&self) -> usize {
        self.count_calls(|c| matches!(c, BackendCall::Delete { .. }))
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    fn count_calls(&self, predicate: impl Fn(&BackendCall) -> bool) -> usize {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter(|c| predicate(c))
            .count()
    }

    /// Records `call` and consumes a pending failure, if any.
    fn record(state: &mut BackendState, call: BackendCall) -> Result<()> {
        state.calls.push(call);
        match state.fail_next.take() {
            Some(message) => Err(anyhow!(message)),
            None => Ok(()),
        }
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn build_page(
    matching: &[Notification],
    request: &PageRequest,
) -> Result<StorePage> {
    let total = matching.len();
    let unread = matching.iter().filter(|n| !n.is_read()).count();
    let unseen = matching.iter().filter(|n| !n.is_seen()).count();

    let (notifications, page_info) = match request {
        PageRequest::Cursor { cursor, size } => {
            let position = |id: &str| {
                matching
                    .iter()
                    .position(|n| n.id == id)
                    .ok_or_else(|| anyhow!("Unknown cursor: {}", id))
            };
            let (start, end) = match cursor {
                CursorRequest::First => (0, (*size).min(total)),
                CursorRequest::After(id) => {
                    let start = position(id)? + 1;
                    (start, (start + size).min(total))
                }
                CursorRequest::Before(id) => {
                    let end = position(id)?;
                    (end.saturating_sub(*size), end)
                }
            };
            let slice = matching[start..end].to_vec();
            let info = PageInfo::Cursor {
                start_cursor: slice.first().map(|n| n.id.clone()),
                end_cursor: slice.last().map(|n| n.id.clone()),
                has_next_page: end < total,
                has_previous_page: start > 0,
            };
            (slice, info)
        }
        PageRequest::Offset { page, size } => {
            if *page == 0 || *size == 0 {
                bail!("Invalid page request: page {} size {}", page, size);
            }
            let total_pages = total.div_ceil(*size) as u32;
            let start = ((*page as usize - 1) * size).min(total);
            let end = (start + size).min(total);
            let info = PageInfo::Offset {
                current_page: *page,
                total_pages,
                per_page: *size,
            };
            (matching[start..end].to_vec(), info)
        }
    };

    Ok(StorePage {
        notifications,
        total,
        unread,
        unseen,
        page_info,
    })
}

#[async_trait]
impl StorePageFetcher for InMemoryNotificationBackend {
    async fn fetch_page(
        &self,
        predicate: &StorePredicate,
        request: &PageRequest,
    ) -> Result<StorePage> {
        let mut state = self.state.lock().unwrap();
        Self::record(
            &mut state,
            BackendCall::FetchPage {
                predicate: predicate.clone(),
                request: request.clone(),
            },
        )?;

        let matching: Vec<Notification> = state
            .notifications
            .iter()
            .filter(|n| predicate.matches(n))
            .cloned()
            .collect();
        build_page(&matching, request)
    }
}

#[async_trait]
impl NotificationActions for InMemoryNotificationBackend {
    async fn perform(
        &self,
        action: NotificationAction,
        notification_id: Option<String>,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::record(
            &mut state,
            BackendCall::Action {
                action,
                notification_id: notification_id.clone(),
            },
        )?;

        let now = now();
        if action.is_bulk() {
            for notification in state.notifications.iter_mut() {
                match action {
                    NotificationAction::MarkAllAsRead => {
                        if notification.read_at.is_none() {
                            notification.read_at = Some(now);
                        }
                        if notification.seen_at.is_none() {
                            notification.seen_at = Some(now);
                        }
                    }
                    NotificationAction::MarkAllAsSeen => {
                        if notification.seen_at.is_none() {
                            notification.seen_at = Some(now);
                        }
                    }
                    _ => {}
                }
            }
            return Ok(());
        }

        let id = notification_id
            .ok_or_else(|| anyhow!("Action {:?} requires a notification id", action))?;
        let notification = state
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| anyhow!("Notification not found: {}", id))?;

        match action {
            NotificationAction::MarkAsRead => {
                notification.read_at = Some(now);
                notification.seen_at = Some(notification.seen_at.unwrap_or(now));
            }
            NotificationAction::MarkAsUnread => notification.read_at = None,
            NotificationAction::Archive => notification.archived_at = Some(now),
            NotificationAction::Unarchive => notification.archived_at = None,
            NotificationAction::MarkAllAsRead | NotificationAction::MarkAllAsSeen => {}
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationDeleter for InMemoryNotificationBackend {
    async fn delete(&self, notification_id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::record(
            &mut state,
            BackendCall::Delete {
                notification_id: notification_id.to_string(),
            },
        )?;

        let index = state
            .notifications
            .iter()
            .position(|n| n.id == notification_id)
            .ok_or_else(|| anyhow!("Notification not found: {}", notification_id))?;
        state.notifications.remove(index);
        Ok(())
    }
}
