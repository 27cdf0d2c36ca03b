//! Realtime events and their delivery to live stores.

mod director;
mod events;
mod listener;

pub use director::StoreDirector;
pub use events::{NotificationChange, RealtimeEvent};
pub use listener::RealtimeListener;
