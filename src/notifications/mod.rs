//! Notification records, store predicates and page payloads

mod models;
mod page;
mod predicate;

pub use models::Notification;
pub use page::{PageInfo, StorePage};
pub use predicate::{ReadFilter, SeenFilter, StorePredicate};
