//! Incremental counter reconciliation.
//!
//! The server reports `total`, `unread` and `unseen` with every page. Between
//! fetches the store keeps them accurate by applying a delta for each local
//! mutation or realtime event instead of requerying. The loaded page window is
//! a subset of the server-side scope, so counters are never recomputed from
//! the loaded records.

use crate::config::UnarchivePolicy;
use crate::notifications::{Notification, ReadFilter, SeenFilter, StorePage, StorePredicate};

/// Aggregate counts of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    pub total: usize,
    pub unread: usize,
    pub unseen: usize,
}

/// A single counter that changed, with its new value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterChange {
    Total(usize),
    Unread(usize),
    Unseen(usize),
}

impl Counters {
    /// Counters as reported by the server for a freshly fetched page.
    pub fn from_page(page: &StorePage) -> Self {
        Self {
            total: page.total,
            unread: page.unread,
            unseen: page.unseen,
        }
    }

    /// The counters that differ from `previous`, one entry per counter.
    pub fn changes_since(&self, previous: &Counters) -> Vec<CounterChange> {
        let mut changes = Vec::new();
        if self.total != previous.total {
            changes.push(CounterChange::Total(self.total));
        }
        if self.unread != previous.unread {
            changes.push(CounterChange::Unread(self.unread));
        }
        if self.unseen != previous.unseen {
            changes.push(CounterChange::Unseen(self.unseen));
        }
        changes
    }
}

/// Applies a signed delta to a counter, saturating at zero.
fn shift(value: usize, delta: i64) -> usize {
    if delta < 0 {
        value.saturating_sub(delta.unsigned_abs() as usize)
    } else {
        value.saturating_add(delta as usize)
    }
}

/// Status transitions of a single notification and their counter deltas.
///
/// Every transition is guarded: applying it to a notification already in the
/// target state returns `false` and touches neither the record nor the
/// counters. After each applied transition the counters are normalized to the
/// predicate's fixed filters: a read-only scope has no unread members, an
/// unread-only scope has only unread members (same for seen).
pub struct CounterReconciler<'a> {
    predicate: &'a StorePredicate,
    unarchive_policy: UnarchivePolicy,
}

impl<'a> CounterReconciler<'a> {
    pub fn new(predicate: &'a StorePredicate, unarchive_policy: UnarchivePolicy) -> Self {
        Self {
            predicate,
            unarchive_policy,
        }
    }

    /// Marks `notification` read (and therefore seen) at `now`.
    pub fn mark_read(&self, notification: &mut Notification, counters: &mut Counters, now: i64) -> bool {
        if notification.read_at.is_some() {
            return false;
        }
        let was_in_scope = self.in_status_scope(notification);

        if notification.seen_at.is_none() {
            counters.unseen = shift(counters.unseen, -1);
        }
        counters.unread = shift(counters.unread, -1);

        notification.read_at = Some(now);
        notification.seen_at = Some(now);

        self.adjust_total_for_scope(notification, was_in_scope, counters);
        self.normalize(counters);
        true
    }

    pub fn mark_unread(&self, notification: &mut Notification, counters: &mut Counters) -> bool {
        if notification.read_at.is_none() {
            return false;
        }
        let was_in_scope = self.in_status_scope(notification);

        counters.unread = shift(counters.unread, 1);
        notification.read_at = None;

        self.adjust_total_for_scope(notification, was_in_scope, counters);
        self.normalize(counters);
        true
    }

    /// Marks `notification` seen at `now`. Used by the mark-all-seen sweep.
    pub fn mark_seen(&self, notification: &mut Notification, counters: &mut Counters, now: i64) -> bool {
        if notification.seen_at.is_some() {
            return false;
        }
        let was_in_scope = self.in_status_scope(notification);

        counters.unseen = shift(counters.unseen, -1);
        notification.seen_at = Some(now);

        self.adjust_total_for_scope(notification, was_in_scope, counters);
        self.normalize(counters);
        true
    }

    /// Archives `notification` at `now`.
    ///
    /// An archived notification no longer counts as pending attention, so
    /// its unread/unseen contributions are dropped. It leaves an
    /// unarchived-only scope; an archived scope keeps its total.
    pub fn archive(&self, notification: &mut Notification, counters: &mut Counters, now: i64) -> bool {
        if notification.archived_at.is_some() {
            return false;
        }

        if notification.seen_at.is_none() {
            counters.unseen = shift(counters.unseen, -1);
        }
        if notification.read_at.is_none() {
            counters.unread = shift(counters.unread, -1);
        }
        if !self.predicate.archived {
            counters.total = shift(counters.total, -1);
        }

        notification.archived_at = Some(now);
        self.normalize(counters);
        true
    }

    pub fn unarchive(&self, notification: &mut Notification, counters: &mut Counters) -> bool {
        if notification.archived_at.is_none() {
            return false;
        }
        notification.archived_at = None;

        if self.unarchive_policy == UnarchivePolicy::Reconcile {
            if self.predicate.archived {
                counters.total = shift(counters.total, -1);
            } else {
                counters.total = shift(counters.total, 1);
                if notification.read_at.is_none() {
                    counters.unread = shift(counters.unread, 1);
                }
                if notification.seen_at.is_none() {
                    counters.unseen = shift(counters.unseen, 1);
                }
            }
            self.normalize(counters);
        }
        true
    }

    /// Counter deltas for a notification about to be removed from the store.
    pub fn delete(&self, notification: &Notification, counters: &mut Counters) {
        counters.total = shift(counters.total, -1);

        let counted_unread = match self.predicate.read {
            ReadFilter::Unread => true,
            ReadFilter::Unspecified => notification.read_at.is_none(),
            ReadFilter::Read => false,
        };
        if counted_unread {
            counters.unread = shift(counters.unread, -1);
        }
        if notification.seen_at.is_none() {
            counters.unseen = shift(counters.unseen, -1);
        }

        self.normalize(counters);
    }

    fn in_status_scope(&self, notification: &Notification) -> bool {
        self.predicate
            .matches_status(notification.is_read(), notification.is_seen())
    }

    /// Moves `total` by the change in read/seen membership.
    fn adjust_total_for_scope(&self, notification: &Notification, was_in_scope: bool, counters: &mut Counters) {
        let is_in_scope = self.in_status_scope(notification);
        let delta = i64::from(is_in_scope) - i64::from(was_in_scope);
        counters.total = shift(counters.total, delta);
    }

    fn normalize(&self, counters: &mut Counters) {
        match self.predicate.read {
            ReadFilter::Read => counters.unread = 0,
            ReadFilter::Unread => counters.unread = counters.total,
            ReadFilter::Unspecified => {}
        }
        match self.predicate.seen {
            SeenFilter::Seen => counters.unseen = 0,
            SeenFilter::Unseen => counters.unseen = counters.total,
            SeenFilter::Unspecified => {}
        }
    }
}
