use std::sync::Mutex;

use notification_store::{ContentObserver, CountObserver, NotificationStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    /// Carries the store length read from inside the callback.
    Reloaded(usize),
    Inserted(Vec<usize>),
    Changed(Vec<usize>),
    Deleted(Vec<usize>),
    HasNextPage(bool),
    Total(usize),
    Unread(usize),
    Unseen(usize),
}

impl ObservedEvent {
    pub fn is_count(&self) -> bool {
        matches!(
            self,
            ObservedEvent::Total(_) | ObservedEvent::Unread(_) | ObservedEvent::Unseen(_)
        )
    }
}

/// Records every event it receives, in order.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn content_events(&self) -> Vec<ObservedEvent> {
        self.events().into_iter().filter(|e| !e.is_count()).collect()
    }

    pub fn count_events(&self) -> Vec<ObservedEvent> {
        self.events().into_iter().filter(|e| e.is_count()).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    fn push(&self, event: ObservedEvent) {
        self.events.lock().unwrap().push(event);
    }
}

impl ContentObserver for RecordingObserver {
    fn store_reloaded(&self, store: &NotificationStore) {
        self.push(ObservedEvent::Reloaded(store.len()));
    }

    fn notifications_inserted(&self, _store: &NotificationStore, indexes: &[usize]) {
        self.push(ObservedEvent::Inserted(indexes.to_vec()));
    }

    fn notifications_changed(&self, _store: &NotificationStore, indexes: &[usize]) {
        self.push(ObservedEvent::Changed(indexes.to_vec()));
    }

    fn notifications_deleted(&self, _store: &NotificationStore, indexes: &[usize]) {
        self.push(ObservedEvent::Deleted(indexes.to_vec()));
    }

    fn has_next_page_changed(&self, _store: &NotificationStore, has_next_page: bool) {
        self.push(ObservedEvent::HasNextPage(has_next_page));
    }
}

impl CountObserver for RecordingObserver {
    fn total_count_changed(&self, _store: &NotificationStore, count: usize) {
        self.push(ObservedEvent::Total(count));
    }

    fn unread_count_changed(&self, _store: &NotificationStore, count: usize) {
        self.push(ObservedEvent::Unread(count));
    }

    fn unseen_count_changed(&self, _store: &NotificationStore, count: usize) {
        self.push(ObservedEvent::Unseen(count));
    }
}
