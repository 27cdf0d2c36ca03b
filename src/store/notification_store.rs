use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::config::StoreConfig;
use crate::notifications::{Notification, PageInfo, StorePredicate};
use crate::remote::RemoteCollaborators;

use super::counters::{CounterChange, CounterReconciler, Counters};
use super::observers::{ContentObserver, CountObserver, ObserverSet};
use super::pagination::{merge_page, CursorRequest, PageRequest, PageSequencer, PaginationState, Placement};
use super::StoreError;

/// Mutable part of a store, guarded by a single lock.
pub(super) struct StoreState {
    /// Newest first, in server delivery order.
    pub(super) notifications: Vec<Notification>,
    pub(super) counters: Counters,
    pub(super) sequencer: PageSequencer,
    /// Bumped on every clear and refresh. Fetches started under an older
    /// epoch discard their result.
    pub(super) epoch: u64,
}

impl StoreState {
    pub(super) fn position(&self, notification_id: &str) -> Option<usize> {
        self.notifications.iter().position(|n| n.id == notification_id)
    }
}

/// Observer event queued while the state lock is held and dispatched after
/// it is released.
pub(super) enum StoreEvent {
    Reloaded,
    Inserted(Vec<usize>),
    Changed(Vec<usize>),
    Deleted(Vec<usize>),
    HasNextPage(bool),
    Count(CounterChange),
}

/// Collects the events produced by one state transition.
#[derive(Default)]
pub(super) struct EventBatch {
    events: Vec<StoreEvent>,
}

impl EventBatch {
    pub(super) fn push(&mut self, event: StoreEvent) {
        self.events.push(event);
    }

    /// Pushes an index event unless `indexes` is empty.
    pub(super) fn indexes(&mut self, indexes: Vec<usize>, event: fn(Vec<usize>) -> StoreEvent) {
        if !indexes.is_empty() {
            self.events.push(event(indexes));
        }
    }

    pub(super) fn counters(&mut self, before: &Counters, after: &Counters) {
        self.events
            .extend(after.changes_since(before).into_iter().map(StoreEvent::Count));
    }

    pub(super) fn has_next_page(&mut self, before: bool, after: bool) {
        if before != after {
            self.events.push(StoreEvent::HasNextPage(after));
        }
    }
}

/// A live, filtered view over the notifications matching one predicate.
///
/// The store holds the loaded pages in server order, the aggregate counters
/// the server reported for the whole scope, and two weakly held observer
/// sets. Local state only changes after the corresponding remote call
/// succeeded; a failed call leaves it untouched.
///
/// `mark_all_read` and `mark_all_seen` only sweep the notifications loaded
/// in memory. Records outside the loaded window are updated on the server
/// but the local counters only account for the loaded ones.
pub struct NotificationStore {
    name: String,
    predicate: StorePredicate,
    config: StoreConfig,
    pub(super) remote: RemoteCollaborators,
    pub(super) state: Mutex<StoreState>,
    fetch_gate: tokio::sync::Mutex<()>,
    content_observers: ObserverSet<dyn ContentObserver>,
    count_observers: ObserverSet<dyn CountObserver>,
}

impl NotificationStore {
    pub fn new(
        name: impl Into<String>,
        predicate: StorePredicate,
        config: StoreConfig,
        remote: RemoteCollaborators,
    ) -> Self {
        let sequencer = PageSequencer::new(config.pagination, config.page_size);
        Self {
            name: name.into(),
            predicate,
            config,
            remote,
            state: Mutex::new(StoreState {
                notifications: Vec::new(),
                counters: Counters::default(),
                sequencer,
                epoch: 0,
            }),
            fetch_gate: tokio::sync::Mutex::new(()),
            content_observers: ObserverSet::new(),
            count_observers: ObserverSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn predicate(&self) -> &StorePredicate {
        &self.predicate
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.state.lock().unwrap().notifications.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<Notification> {
        self.state.lock().unwrap().notifications.get(index).cloned()
    }

    pub fn find(&self, notification_id: &str) -> Option<(usize, Notification)> {
        let state = self.state.lock().unwrap();
        state
            .position(notification_id)
            .map(|index| (index, state.notifications[index].clone()))
    }

    /// Snapshot of the loaded notifications.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state.lock().unwrap().notifications.clone()
    }

    pub fn counters(&self) -> Counters {
        self.state.lock().unwrap().counters
    }

    pub fn total_count(&self) -> usize {
        self.counters().total
    }

    pub fn unread_count(&self) -> usize {
        self.counters().unread
    }

    pub fn unseen_count(&self) -> usize {
        self.counters().unseen
    }

    pub fn has_next_page(&self) -> bool {
        self.state.lock().unwrap().sequencer.has_next_page()
    }

    pub fn pagination_state(&self) -> PaginationState {
        self.state.lock().unwrap().sequencer.state().clone()
    }

    /// Registers a content observer. The store only keeps a weak reference.
    pub fn add_content_observer<O: ContentObserver + 'static>(&self, observer: &Arc<O>) -> bool {
        let observer: Arc<dyn ContentObserver> = observer.clone();
        self.content_observers.add(&observer)
    }

    pub fn remove_content_observer<O: ContentObserver + 'static>(&self, observer: &Arc<O>) -> bool {
        let observer: Arc<dyn ContentObserver> = observer.clone();
        self.content_observers.remove(&observer)
    }

    /// Registers a count observer. The store only keeps a weak reference.
    pub fn add_count_observer<O: CountObserver + 'static>(&self, observer: &Arc<O>) -> bool {
        let observer: Arc<dyn CountObserver> = observer.clone();
        self.count_observers.add(&observer)
    }

    pub fn remove_count_observer<O: CountObserver + 'static>(&self, observer: &Arc<O>) -> bool {
        let observer: Arc<dyn CountObserver> = observer.clone();
        self.count_observers.remove(&observer)
    }

    /// Replaces the collection with the newest page.
    ///
    /// Local notifications and counters are dropped only once the page has
    /// arrived, so a failed refresh keeps the previous content.
    pub async fn refresh(&self) -> Result<Vec<Notification>, StoreError> {
        let _gate = self.fetch_gate.lock().await;

        let (request, epoch) = {
            let state = self.state.lock().unwrap();
            (state.sequencer.first_page_request(), state.epoch)
        };

        debug!("Store {} refreshing with {:?}", self.name, request);
        let page = self
            .remote
            .fetcher
            .fetch_page(&self.predicate, &request)
            .await
            .map_err(|e| self.remote_failure("refresh", e))?;

        let mut events = EventBatch::default();
        let loaded = {
            let mut state = self.state.lock().unwrap();
            if state.epoch != epoch {
                debug!("Store {} discarded a stale refresh page", self.name);
                return Ok(Vec::new());
            }
            let state = &mut *state;

            let counters_before = state.counters;
            let had_next_page = state.sequencer.has_next_page();

            state.epoch += 1;
            state.counters = Counters::from_page(&page);
            state.notifications.clear();
            merge_page(&mut state.notifications, page.notifications, Placement::Append);
            state.sequencer.record_page(&page.page_info, true);

            events.push(StoreEvent::Reloaded);
            events.has_next_page(had_next_page, state.sequencer.has_next_page());
            events.counters(&counters_before, &state.counters);
            state.notifications.clone()
        };

        info!(
            "Store {} reloaded with {} notifications (total {})",
            self.name,
            loaded.len(),
            self.total_count()
        );
        self.emit(events);
        Ok(loaded)
    }

    /// Appends the next page.
    ///
    /// Once the server reported the last page this returns an empty vector
    /// without any network call.
    pub async fn fetch_next(&self) -> Result<Vec<Notification>, StoreError> {
        let _gate = self.fetch_gate.lock().await;

        let (request, epoch) = {
            let state = self.state.lock().unwrap();
            match state.sequencer.next_page_request() {
                Some(request) => (request, state.epoch),
                None => return Ok(Vec::new()),
            }
        };
        let first_page = matches!(
            request,
            PageRequest::Cursor {
                cursor: CursorRequest::First,
                ..
            } | PageRequest::Offset { page: 1, .. }
        );

        debug!("Store {} fetching {:?}", self.name, request);
        let page = self
            .remote
            .fetcher
            .fetch_page(&self.predicate, &request)
            .await
            .map_err(|e| self.remote_failure("fetch next page", e))?;

        let mut events = EventBatch::default();
        let appended = {
            let mut state = self.state.lock().unwrap();
            if state.epoch != epoch {
                debug!("Store {} discarded a stale page", self.name);
                return Ok(Vec::new());
            }
            let state = &mut *state;

            let counters_before = state.counters;
            let had_next_page = state.sequencer.has_next_page();

            state.counters = Counters::from_page(&page);
            let indexes = merge_page(&mut state.notifications, page.notifications, Placement::Append);
            state.sequencer.record_page(&page.page_info, first_page);

            let appended: Vec<Notification> = indexes
                .iter()
                .map(|&i| state.notifications[i].clone())
                .collect();
            events.indexes(indexes, StoreEvent::Inserted);
            events.has_next_page(had_next_page, state.sequencer.has_next_page());
            events.counters(&counters_before, &state.counters);
            appended
        };

        debug!("Store {} appended {} notifications", self.name, appended.len());
        self.emit(events);
        Ok(appended)
    }

    /// Fetches every page newer than the newest loaded notification and
    /// prepends them.
    ///
    /// Only available for cursor pagination, after at least one page has
    /// been loaded.
    pub async fn fetch_all_previous(&self) -> Result<Vec<Notification>, StoreError> {
        let _gate = self.fetch_gate.lock().await;

        let (mut cursor, epoch) = {
            let state = self.state.lock().unwrap();
            if matches!(state.sequencer.state(), PaginationState::Offset { .. }) {
                return Err(StoreError::Precondition(
                    "fetching previous pages requires cursor pagination".to_string(),
                ));
            }
            match state.sequencer.newest_cursor() {
                Some(cursor) => (cursor.to_string(), state.epoch),
                None => {
                    return Err(StoreError::Precondition(
                        "fetching previous pages requires an initial fetch".to_string(),
                    ))
                }
            }
        };

        let mut accumulated: Vec<Notification> = Vec::new();
        let mut last_page = None;
        let mut newest_cursor = None;
        loop {
            let request = self.state.lock().unwrap().sequencer.previous_page_request(&cursor);
            let page = self
                .remote
                .fetcher
                .fetch_page(&self.predicate, &request)
                .await
                .map_err(|e| self.remote_failure("fetch previous page", e))?;

            let (start_cursor, has_previous_page) = match &page.page_info {
                PageInfo::Cursor {
                    start_cursor,
                    has_previous_page,
                    ..
                } => (start_cursor.clone(), *has_previous_page),
                PageInfo::Offset { .. } => (None, false),
            };

            // Each page is newer than everything accumulated so far
            accumulated.splice(0..0, page.notifications.iter().cloned());
            last_page = Some(page);
            if start_cursor.is_some() {
                newest_cursor = start_cursor.clone();
            }

            match start_cursor {
                Some(next) if has_previous_page => cursor = next,
                _ => break,
            }
        }

        let mut events = EventBatch::default();
        let prepended = {
            let mut state = self.state.lock().unwrap();
            if state.epoch != epoch {
                debug!("Store {} discarded stale previous pages", self.name);
                return Ok(Vec::new());
            }
            let state = &mut *state;
            let counters_before = state.counters;

            let indexes = merge_page(&mut state.notifications, accumulated, Placement::Prepend);
            if let Some(cursor) = newest_cursor {
                state.sequencer.record_newest_cursor(cursor);
            }
            if let Some(page) = &last_page {
                state.counters = Counters::from_page(page);
            }

            let prepended: Vec<Notification> = indexes
                .iter()
                .map(|&i| state.notifications[i].clone())
                .collect();
            events.indexes(indexes, StoreEvent::Inserted);
            events.counters(&counters_before, &state.counters);
            prepended
        };

        debug!("Store {} prepended {} notifications", self.name, prepended.len());
        self.emit(events);
        Ok(prepended)
    }

    /// Drops every loaded notification, zeroes the counters and resets
    /// pagination, as if the store had just been created.
    ///
    /// Any fetch in flight is discarded when it completes.
    pub fn clear(&self) {
        let mut events = EventBatch::default();
        {
            let mut state = self.state.lock().unwrap();
            let counters_before = state.counters;
            let had_next_page = state.sequencer.has_next_page();
            let prior = state.notifications.len();

            state.notifications.clear();
            state.counters = Counters::default();
            state.sequencer.reset();
            state.epoch += 1;

            events.indexes((0..prior).collect(), StoreEvent::Deleted);
            events.has_next_page(had_next_page, state.sequencer.has_next_page());
            events.counters(&counters_before, &state.counters);
        }
        info!("Store {} cleared", self.name);
        self.emit(events);
    }

    pub(super) fn reconciler(&self) -> CounterReconciler<'_> {
        CounterReconciler::new(&self.predicate, self.config.unarchive_policy)
    }

    pub(super) fn remote_failure(&self, operation: &str, error: anyhow::Error) -> StoreError {
        warn!("Store {} failed to {}: {}", self.name, operation, error);
        StoreError::Remote(error)
    }

    /// Dispatches queued events. Must be called without holding the state lock.
    pub(super) fn emit(&self, batch: EventBatch) {
        for event in batch.events {
            match event {
                StoreEvent::Reloaded => self.content_observers.for_each(|o| o.store_reloaded(self)),
                StoreEvent::Inserted(indexes) => self
                    .content_observers
                    .for_each(|o| o.notifications_inserted(self, &indexes)),
                StoreEvent::Changed(indexes) => self
                    .content_observers
                    .for_each(|o| o.notifications_changed(self, &indexes)),
                StoreEvent::Deleted(indexes) => self
                    .content_observers
                    .for_each(|o| o.notifications_deleted(self, &indexes)),
                StoreEvent::HasNextPage(has_next_page) => self
                    .content_observers
                    .for_each(|o| o.has_next_page_changed(self, has_next_page)),
                StoreEvent::Count(CounterChange::Total(count)) => self
                    .count_observers
                    .for_each(|o| o.total_count_changed(self, count)),
                StoreEvent::Count(CounterChange::Unread(count)) => self
                    .count_observers
                    .for_each(|o| o.unread_count_changed(self, count)),
                StoreEvent::Count(CounterChange::Unseen(count)) => self
                    .count_observers
                    .for_each(|o| o.unseen_count_changed(self, count)),
            }
        }
    }
}

pub(super) fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
