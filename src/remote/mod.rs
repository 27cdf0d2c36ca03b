//! Remote collaborators the store delegates network work to.

mod collaborators;
mod in_memory;

pub use collaborators::{
    NotificationAction, NotificationActions, NotificationDeleter, RemoteCollaborators,
    StorePageFetcher,
};
#[cfg(feature = "mock")]
pub use collaborators::{MockNotificationActions, MockNotificationDeleter, MockStorePageFetcher};
pub use in_memory::{BackendCall, InMemoryNotificationBackend};
