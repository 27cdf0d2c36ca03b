//! Page payloads returned by the fetch collaborator.

use serde::{Deserialize, Serialize};

use super::Notification;

/// Pagination metadata of a fetched page.
///
/// Backends paginate either with opaque cursors or with page numbers; the
/// store follows whichever variant the fetch collaborator returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "snake_case")]
pub enum PageInfo {
    Cursor {
        /// Cursor of the newest notification in the page.
        start_cursor: Option<String>,
        /// Cursor of the oldest notification in the page.
        end_cursor: Option<String>,
        has_next_page: bool,
        has_previous_page: bool,
    },
    Offset {
        current_page: u32,
        total_pages: u32,
        per_page: usize,
    },
}

/// One server-delivered batch of notifications plus aggregate counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorePage {
    pub notifications: Vec<Notification>,
    pub total: usize,
    pub unread: usize,
    pub unseen: usize,
    pub page_info: PageInfo,
}
