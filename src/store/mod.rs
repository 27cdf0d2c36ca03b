//! The notification store and its building blocks.

mod actions;
mod counters;
mod error;
mod notification_store;
mod observers;
mod pagination;
mod realtime_sync;

pub use counters::{CounterChange, CounterReconciler, Counters};
pub use error::StoreError;
pub use notification_store::NotificationStore;
pub use observers::{ContentObserver, CountObserver, ObserverSet};
pub use pagination::{
    merge_page, CursorRequest, PageRequest, PageSequencer, PaginationState, Placement,
};
