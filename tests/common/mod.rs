//! Common test infrastructure
//!
//! Builds stores over an in-memory backend with a recording observer
//! attached. Tests should only import from this module.

mod edge_cursor_fetcher;
mod fixtures;
mod gated_fetcher;
mod observer;
mod test_store;

#[allow(unused_imports)]
pub use edge_cursor_fetcher::EdgeCursorFetcher;
pub use fixtures::*;
#[allow(unused_imports)]
pub use gated_fetcher::GatedFetcher;
pub use observer::{ObservedEvent, RecordingObserver};
pub use test_store::TestStore;
