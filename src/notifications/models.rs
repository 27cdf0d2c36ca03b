//! Notification data models

use serde::{Deserialize, Serialize};

/// A notification owned by the server and cached by a store.
///
/// Timestamps are unix seconds. `sent_at` never changes; the status
/// timestamps (`seen_at`, `read_at`, `archived_at`) are edited by the store
/// as mutations and realtime events are reconciled. A read notification must
/// also be seen, which the counter reconciler keeps true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub action_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub custom_attributes: serde_json::Value,
    pub sent_at: i64,
    #[serde(default)]
    pub seen_at: Option<i64>,
    #[serde(default)]
    pub read_at: Option<i64>,
    #[serde(default)]
    pub archived_at: Option<i64>,
}

impl Notification {
    /// Create an unseen, unread, unarchived notification.
    pub fn new(id: impl Into<String>, title: impl Into<String>, sent_at: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: None,
            action_url: None,
            category: None,
            topic: None,
            custom_attributes: serde_json::Value::Null,
            sent_at,
            seen_at: None,
            read_at: None,
            archived_at: None,
        }
    }

    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub fn is_seen(&self) -> bool {
        self.seen_at.is_some()
    }

    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}
