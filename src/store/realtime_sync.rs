//! Realtime reconciliation.
//!
//! Each pushed event is either patched into the loaded collection or
//! answered with a full refresh when the store cannot tell where the change
//! belongs. Patches never reorder the collection.

use tracing::{debug, info};

use crate::notifications::{ReadFilter, SeenFilter};
use crate::realtime::{NotificationChange, RealtimeEvent};

use super::notification_store::{now, EventBatch, NotificationStore, StoreEvent};
use super::StoreError;

impl NotificationStore {
    pub async fn apply_realtime_event(&self, event: &RealtimeEvent) -> Result<(), StoreError> {
        debug!("Store {} received {}", self.name(), event.event_type());
        match event {
            RealtimeEvent::NotificationCreated { .. } | RealtimeEvent::Reload => {
                self.refresh().await?;
            }
            RealtimeEvent::NotificationDeleted { id } => {
                self.remove_deleted(id);
            }
            RealtimeEvent::NotificationChanged { id, change } => {
                let patched = self.patch_changed(id, *change);
                if !patched {
                    debug!("Store {} does not hold {}, refreshing", self.name(), id);
                    self.refresh().await?;
                }
            }
            RealtimeEvent::AllRead => {
                let excluded = self.predicate().read == ReadFilter::Unread
                    || self.predicate().seen == SeenFilter::Unseen;
                self.clear_or_refresh(excluded).await?;
            }
            RealtimeEvent::AllSeen => {
                let excluded = self.predicate().seen == SeenFilter::Unseen;
                self.clear_or_refresh(excluded).await?;
            }
        }
        Ok(())
    }

    /// Clears locally when no notification can match the predicate anymore.
    async fn clear_or_refresh(&self, excluded: bool) -> Result<(), StoreError> {
        if excluded {
            info!("Store {} scope emptied by bulk event", self.name());
            self.clear();
        } else {
            self.refresh().await?;
        }
        Ok(())
    }

    fn remove_deleted(&self, notification_id: &str) {
        let mut events = EventBatch::default();
        {
            let mut state = self.state.lock().unwrap();
            let Some(index) = state.position(notification_id) else {
                return;
            };
            let state = &mut *state;
            let counters_before = state.counters;

            self.reconciler()
                .delete(&state.notifications[index], &mut state.counters);
            state.notifications.remove(index);

            events.push(StoreEvent::Deleted(vec![index]));
            events.counters(&counters_before, &state.counters);
        }
        self.emit(events);
    }

    /// Applies a status change to a loaded notification. Returns false when
    /// the notification is not loaded.
    fn patch_changed(&self, notification_id: &str, change: NotificationChange) -> bool {
        let mut events = EventBatch::default();
        {
            let mut state = self.state.lock().unwrap();
            let Some(index) = state.position(notification_id) else {
                return false;
            };
            let state = &mut *state;
            let counters_before = state.counters;
            let reconciler = self.reconciler();
            let notification = &mut state.notifications[index];

            let applied = match change {
                NotificationChange::Read => {
                    reconciler.mark_read(notification, &mut state.counters, now())
                }
                NotificationChange::Unread => reconciler.mark_unread(notification, &mut state.counters),
                NotificationChange::Archive => {
                    reconciler.archive(notification, &mut state.counters, now())
                }
            };

            // Leaving the scope was already accounted for by the transition
            if !self.predicate().matches(notification) {
                state.notifications.remove(index);
                events.push(StoreEvent::Deleted(vec![index]));
            } else if applied {
                events.push(StoreEvent::Changed(vec![index]));
            }
            events.counters(&counters_before, &state.counters);
        }
        self.emit(events);
        true
    }
}
