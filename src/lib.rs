//! Client-side cache for a paginated, server-owned notification feed.
//!
//! A [`NotificationStore`] holds the notifications matching one
//! [`StorePredicate`], pages through them, applies status mutations after the
//! server confirmed them and keeps its counters and observers consistent
//! with realtime events pushed by the server.

pub mod config;
pub mod notifications;
pub mod realtime;
pub mod remote;
pub mod store;

pub use config::{PaginationStyle, StoreConfig, UnarchivePolicy};
pub use notifications::{Notification, ReadFilter, SeenFilter, StorePredicate};
pub use realtime::{NotificationChange, RealtimeEvent, RealtimeListener, StoreDirector};
pub use remote::{InMemoryNotificationBackend, RemoteCollaborators};
pub use store::{ContentObserver, CountObserver, NotificationStore, StoreError};
