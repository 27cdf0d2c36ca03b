//! Store predicates and the matching rule.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Notification;

/// Read-state filter of a predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadFilter {
    /// Only read notifications.
    Read,
    /// Only unread notifications.
    Unread,
    #[default]
    Unspecified,
}

impl ReadFilter {
    pub fn accepts(self, is_read: bool) -> bool {
        match self {
            ReadFilter::Read => is_read,
            ReadFilter::Unread => !is_read,
            ReadFilter::Unspecified => true,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            ReadFilter::Read => "read",
            ReadFilter::Unread => "unread",
            ReadFilter::Unspecified => "any",
        }
    }
}

/// Seen-state filter of a predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeenFilter {
    /// Only seen notifications.
    Seen,
    /// Only unseen notifications.
    Unseen,
    #[default]
    Unspecified,
}

impl SeenFilter {
    pub fn accepts(self, is_seen: bool) -> bool {
        match self {
            SeenFilter::Seen => is_seen,
            SeenFilter::Unseen => !is_seen,
            SeenFilter::Unspecified => true,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            SeenFilter::Seen => "seen",
            SeenFilter::Unseen => "unseen",
            SeenFilter::Unspecified => "any",
        }
    }
}

/// The logical scope of a store.
///
/// Predicates are immutable values and are used as hash keys by the store
/// director, so categories and topics are kept in ordered sets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct StorePredicate {
    pub read: ReadFilter,
    pub seen: SeenFilter,
    /// `true` selects archived notifications only, `false` unarchived only.
    pub archived: bool,
    pub categories: BTreeSet<String>,
    pub topics: BTreeSet<String>,
}

impl StorePredicate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read(mut self, read: ReadFilter) -> Self {
        self.read = read;
        self
    }

    pub fn with_seen(mut self, seen: SeenFilter) -> Self {
        self.seen = seen;
        self
    }

    pub fn with_archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `notification` belongs to the scope described by this predicate.
    pub fn matches(&self, notification: &Notification) -> bool {
        self.archived == notification.is_archived()
            && self.matches_status(notification.is_read(), notification.is_seen())
            && matches_set(&self.categories, notification.category.as_deref())
            && matches_set(&self.topics, notification.topic.as_deref())
    }

    /// The read/seen part of [`StorePredicate::matches`].
    pub fn matches_status(&self, is_read: bool, is_seen: bool) -> bool {
        self.read.accepts(is_read) && self.seen.accepts(is_seen)
    }
}

fn matches_set(allowed: &BTreeSet<String>, value: Option<&str>) -> bool {
    if allowed.is_empty() {
        return true;
    }
    value.is_some_and(|v| allowed.contains(v))
}

impl fmt::Display for StorePredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read={} seen={} archived={}",
            self.read.as_str(),
            self.seen.as_str(),
            self.archived
        )?;
        if !self.categories.is_empty() {
            let categories: Vec<&str> = self.categories.iter().map(String::as_str).collect();
            write!(f, " categories={}", categories.join(","))?;
        }
        if !self.topics.is_empty() {
            let topics: Vec<&str> = self.topics.iter().map(String::as_str).collect();
            write!(f, " topics={}", topics.join(","))?;
        }
        Ok(())
    }
}
