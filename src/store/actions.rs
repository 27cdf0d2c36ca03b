//! Status mutations.
//!
//! Every mutation calls the server first and only touches local state once
//! the call succeeded. The targeted notification is looked up again after
//! the await: a realtime event may have removed it in the meantime.

use tracing::debug;

use crate::notifications::Notification;
use crate::remote::NotificationAction;

use super::counters::{CounterReconciler, Counters};
use super::notification_store::{now, EventBatch, NotificationStore, StoreEvent};
use super::StoreError;

type Transition = fn(&CounterReconciler<'_>, &mut Notification, &mut Counters, i64) -> bool;

impl NotificationStore {
    pub async fn mark_as_read(&self, notification_id: &str) -> Result<Notification, StoreError> {
        self.transition(NotificationAction::MarkAsRead, notification_id, |r, n, c, now| {
            r.mark_read(n, c, now)
        })
        .await
    }

    pub async fn mark_as_unread(&self, notification_id: &str) -> Result<Notification, StoreError> {
        self.transition(NotificationAction::MarkAsUnread, notification_id, |r, n, c, _| {
            r.mark_unread(n, c)
        })
        .await
    }

    pub async fn archive(&self, notification_id: &str) -> Result<Notification, StoreError> {
        self.transition(NotificationAction::Archive, notification_id, |r, n, c, now| {
            r.archive(n, c, now)
        })
        .await
    }

    /// Clears `archived_at`. Counters follow the configured unarchive policy.
    pub async fn unarchive(&self, notification_id: &str) -> Result<Notification, StoreError> {
        self.transition(NotificationAction::Unarchive, notification_id, |r, n, c, _| {
            r.unarchive(n, c)
        })
        .await
    }

    pub async fn delete(&self, notification_id: &str) -> Result<(), StoreError> {
        self.remote
            .deleter
            .delete(notification_id)
            .await
            .map_err(|e| self.remote_failure("delete notification", e))?;

        let mut events = EventBatch::default();
        {
            let mut state = self.state.lock().unwrap();
            let index = state
                .position(notification_id)
                .ok_or_else(|| StoreError::NotFound(notification_id.to_string()))?;
            let state = &mut *state;
            let counters_before = state.counters;

            self.reconciler()
                .delete(&state.notifications[index], &mut state.counters);
            state.notifications.remove(index);

            events.push(StoreEvent::Deleted(vec![index]));
            events.counters(&counters_before, &state.counters);
        }

        debug!("Store {} deleted {}", self.name(), notification_id);
        self.emit(events);
        Ok(())
    }

    /// Marks every loaded notification read.
    ///
    /// The server marks its whole dataset, but only loaded records are swept
    /// locally.
    pub async fn mark_all_read(&self) -> Result<(), StoreError> {
        self.sweep(NotificationAction::MarkAllAsRead, |r, n, c, now| {
            r.mark_read(n, c, now)
        })
        .await
    }

    /// Marks every loaded notification seen. Same scope as [`Self::mark_all_read`].
    pub async fn mark_all_seen(&self) -> Result<(), StoreError> {
        self.sweep(NotificationAction::MarkAllAsSeen, |r, n, c, now| {
            r.mark_seen(n, c, now)
        })
        .await
    }

    async fn transition(
        &self,
        action: NotificationAction,
        notification_id: &str,
        apply: Transition,
    ) -> Result<Notification, StoreError> {
        self.remote
            .actions
            .perform(action, Some(notification_id.to_string()))
            .await
            .map_err(|e| self.remote_failure("update notification", e))?;

        let mut events = EventBatch::default();
        let notification = {
            let mut state = self.state.lock().unwrap();
            let index = state
                .position(notification_id)
                .ok_or_else(|| StoreError::NotFound(notification_id.to_string()))?;
            let state = &mut *state;
            let counters_before = state.counters;

            let applied = apply(
                &self.reconciler(),
                &mut state.notifications[index],
                &mut state.counters,
                now(),
            );
            if applied {
                events.push(StoreEvent::Changed(vec![index]));
                events.counters(&counters_before, &state.counters);
            } else {
                debug!(
                    "Store {}: {:?} left {} unchanged",
                    self.name(),
                    action,
                    notification_id
                );
            }
            state.notifications[index].clone()
        };

        self.emit(events);
        Ok(notification)
    }

    async fn sweep(&self, action: NotificationAction, apply: Transition) -> Result<(), StoreError> {
        self.remote
            .actions
            .perform(action, None)
            .await
            .map_err(|e| self.remote_failure("update all notifications", e))?;

        let mut events = EventBatch::default();
        {
            let mut state = self.state.lock().unwrap();
            let state = &mut *state;
            let counters_before = state.counters;
            let reconciler = self.reconciler();
            let now = now();

            let changed: Vec<usize> = state
                .notifications
                .iter_mut()
                .enumerate()
                .filter_map(|(index, notification)| {
                    apply(&reconciler, notification, &mut state.counters, now).then_some(index)
                })
                .collect();

            debug!(
                "Store {}: {:?} changed {} loaded notifications",
                self.name(),
                action,
                changed.len()
            );
            events.indexes(changed, StoreEvent::Changed);
            events.counters(&counters_before, &state.counters);
        }

        self.emit(events);
        Ok(())
    }
}
