use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use notification_store::notifications::{PageInfo, StorePage, StorePredicate};
use notification_store::remote::{InMemoryNotificationBackend, StorePageFetcher};
use notification_store::store::{CursorRequest, PageRequest};

const EDGE_PREFIX: &str = "edge:";

/// Fetcher whose cursors are opaque edge tokens rather than notification ids.
pub struct EdgeCursorFetcher {
    inner: Arc<InMemoryNotificationBackend>,
}

impl EdgeCursorFetcher {
    pub fn new(inner: Arc<InMemoryNotificationBackend>) -> Self {
        Self { inner }
    }
}

fn to_edge(cursor: Option<String>) -> Option<String> {
    cursor.map(|id| format!("{}{}", EDGE_PREFIX, id))
}

fn from_edge(cursor: &str) -> Result<String> {
    cursor
        .strip_prefix(EDGE_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| anyhow!("not an edge cursor: {}", cursor))
}

#[async_trait]
impl StorePageFetcher for EdgeCursorFetcher {
    async fn fetch_page(&self, predicate: &StorePredicate, request: &PageRequest) -> Result<StorePage> {
        let request = match request {
            PageRequest::Cursor { cursor, size } => PageRequest::Cursor {
                cursor: match cursor {
                    CursorRequest::First => CursorRequest::First,
                    CursorRequest::After(edge) => CursorRequest::After(from_edge(edge)?),
                    CursorRequest::Before(edge) => CursorRequest::Before(from_edge(edge)?),
                },
                size: *size,
            },
            other => other.clone(),
        };

        let mut page = self.inner.fetch_page(predicate, &request).await?;
        page.page_info = match page.page_info {
            PageInfo::Cursor {
                start_cursor,
                end_cursor,
                has_next_page,
                has_previous_page,
            } => PageInfo::Cursor {
                start_cursor: to_edge(start_cursor),
                end_cursor: to_edge(end_cursor),
                has_next_page,
                has_previous_page,
            },
            other => other,
        };
        Ok(page)
    }
}
