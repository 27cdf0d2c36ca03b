//! Pagination state and page merging.

use std::collections::HashSet;

use tracing::debug;

use crate::config::PaginationStyle;
use crate::notifications::{Notification, PageInfo};

/// Cursor position requested from a cursor-paginated backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorRequest {
    /// Newest page.
    First,
    /// The page following (older than) the given cursor.
    After(String),
    /// The page preceding (newer than) the given cursor.
    Before(String),
}

/// A page request handed to the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageRequest {
    Cursor { cursor: CursorRequest, size: usize },
    /// `page` is 1-based.
    Offset { page: u32, size: usize },
}

/// Where a fetched batch goes in the ordered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Append,
    Prepend,
}

/// Forward pagination state of a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaginationState {
    Cursor {
        /// Server cursor of the newest loaded page, used for backward catch-up.
        newest_cursor: Option<String>,
        /// Cursor to continue from, `None` before the first page.
        next_cursor: Option<String>,
        has_next_page: bool,
    },
    Offset {
        next_page: u32,
        has_next_page: bool,
    },
}

impl PaginationState {
    pub fn new(style: PaginationStyle) -> Self {
        match style {
            PaginationStyle::Cursor => PaginationState::Cursor {
                newest_cursor: None,
                next_cursor: None,
                has_next_page: true,
            },
            PaginationStyle::Offset => PaginationState::Offset {
                next_page: 1,
                has_next_page: true,
            },
        }
    }

    pub fn has_next_page(&self) -> bool {
        match self {
            PaginationState::Cursor { has_next_page, .. } => *has_next_page,
            PaginationState::Offset { has_next_page, .. } => *has_next_page,
        }
    }

    fn style(&self) -> PaginationStyle {
        match self {
            PaginationState::Cursor { .. } => PaginationStyle::Cursor,
            PaginationState::Offset { .. } => PaginationStyle::Offset,
        }
    }
}

/// Decides which page to request next and records what the server returned.
///
/// The sequencer does not serialize overlapping requests; the store holds a
/// fetch gate around every request/merge pair.
#[derive(Debug, Clone)]
pub struct PageSequencer {
    page_size: usize,
    state: PaginationState,
}

impl PageSequencer {
    pub fn new(style: PaginationStyle, page_size: usize) -> Self {
        Self {
            page_size,
            state: PaginationState::new(style),
        }
    }

    pub fn state(&self) -> &PaginationState {
        &self.state
    }

    pub fn has_next_page(&self) -> bool {
        self.state.has_next_page()
    }

    /// Back to the initial state, keeping the current pagination style.
    pub fn reset(&mut self) {
        self.state = PaginationState::new(self.state.style());
    }

    /// Request for the newest page, regardless of the current position.
    pub fn first_page_request(&self) -> PageRequest {
        match self.state {
            PaginationState::Cursor { .. } => PageRequest::Cursor {
                cursor: CursorRequest::First,
                size: self.page_size,
            },
            PaginationState::Offset { .. } => PageRequest::Offset {
                page: 1,
                size: self.page_size,
            },
        }
    }

    /// Request continuing from the stored position, `None` once exhausted.
    pub fn next_page_request(&self) -> Option<PageRequest> {
        if !self.has_next_page() {
            return None;
        }
        let request = match &self.state {
            PaginationState::Cursor { next_cursor, .. } => PageRequest::Cursor {
                cursor: match next_cursor {
                    Some(cursor) => CursorRequest::After(cursor.clone()),
                    None => CursorRequest::First,
                },
                size: self.page_size,
            },
            PaginationState::Offset { next_page, .. } => PageRequest::Offset {
                page: *next_page,
                size: self.page_size,
            },
        };
        Some(request)
    }

    /// Request for the page immediately newer than `cursor`.
    pub fn previous_page_request(&self, cursor: &str) -> PageRequest {
        PageRequest::Cursor {
            cursor: CursorRequest::Before(cursor.to_string()),
            size: self.page_size,
        }
    }

    /// Cursor of the newest loaded notification, if the store is cursor paginated.
    pub fn newest_cursor(&self) -> Option<&str> {
        match &self.state {
            PaginationState::Cursor { newest_cursor, .. } => newest_cursor.as_deref(),
            PaginationState::Offset { .. } => None,
        }
    }

    /// Advances the forward position from a fetched page.
    ///
    /// The backend decides the variant: a page whose metadata disagrees with
    /// the configured style switches the state to the backend's style.
    pub fn record_page(&mut self, info: &PageInfo, first_page: bool) {
        let previous_newest = match &self.state {
            PaginationState::Cursor { newest_cursor, .. } if !first_page => newest_cursor.clone(),
            _ => None,
        };

        self.state = match info {
            PageInfo::Cursor {
                start_cursor,
                end_cursor,
                has_next_page,
                ..
            } => PaginationState::Cursor {
                newest_cursor: previous_newest.or_else(|| start_cursor.clone()),
                next_cursor: end_cursor.clone(),
                has_next_page: *has_next_page && end_cursor.is_some(),
            },
            PageInfo::Offset {
                current_page,
                total_pages,
                ..
            } => PaginationState::Offset {
                next_page: current_page.saturating_add(1),
                has_next_page: current_page < total_pages,
            },
        };
    }

    /// Records the newest cursor reached by a backward catch-up.
    pub fn record_newest_cursor(&mut self, cursor: String) {
        if let PaginationState::Cursor { newest_cursor, .. } = &mut self.state {
            *newest_cursor = Some(cursor);
        }
    }
}

/// Merges `batch` into `collection` and returns the indexes it now occupies.
///
/// Notifications whose id is already loaded are skipped: a backend whose
/// dataset shifted between two page requests can deliver the same record
/// twice. Existing records never move relative to each other.
pub fn merge_page(
    collection: &mut Vec<Notification>,
    batch: Vec<Notification>,
    placement: Placement,
) -> Vec<usize> {
    let mut known: HashSet<String> = collection.iter().map(|n| n.id.clone()).collect();
    let received = batch.len();
    let fresh: Vec<Notification> = batch
        .into_iter()
        .filter(|n| known.insert(n.id.clone()))
        .collect();

    if fresh.len() < received {
        debug!(
            "Skipped {} already loaded notifications while merging page",
            received - fresh.len()
        );
    }

    let count = fresh.len();
    match placement {
        Placement::Append => {
            let start = collection.len();
            collection.extend(fresh);
            (start..start + count).collect()
        }
        Placement::Prepend => {
            collection.splice(0..0, fresh);
            (0..count).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(collection: &[Notification]) -> Vec<&str> {
        collection.iter().map(|n| n.id.as_str()).collect()
    }

    fn batch(ids: &[&str]) -> Vec<Notification> {
        ids.iter()
            .map(|id| Notification::new(*id, "Title", 1700000000))
            .collect()
    }

    fn cursor_info(start: &str, end: &str, has_next: bool) -> PageInfo {
        PageInfo::Cursor {
            start_cursor: Some(start.to_string()),
            end_cursor: Some(end.to_string()),
            has_next_page: has_next,
            has_previous_page: false,
        }
    }

    #[test]
    fn test_cursor_sequencer_starts_at_first_page() {
        let sequencer = PageSequencer::new(PaginationStyle::Cursor, 20);

        assert!(sequencer.has_next_page());
        assert_eq!(
            sequencer.next_page_request(),
            Some(PageRequest::Cursor {
                cursor: CursorRequest::First,
                size: 20
            })
        );
        assert!(sequencer.newest_cursor().is_none());
    }

    #[test]
    fn test_cursor_sequencer_advances_after_end_cursor() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Cursor, 2);
        sequencer.record_page(&cursor_info("n1", "n2", true), true);

        assert_eq!(
            sequencer.next_page_request(),
            Some(PageRequest::Cursor {
                cursor: CursorRequest::After("n2".to_string()),
                size: 2
            })
        );
        assert_eq!(sequencer.newest_cursor(), Some("n1"));

        // Later pages do not move the newest cursor
        sequencer.record_page(&cursor_info("n3", "n4", false), false);
        assert_eq!(sequencer.newest_cursor(), Some("n1"));
        assert!(!sequencer.has_next_page());
        assert!(sequencer.next_page_request().is_none());
    }

    #[test]
    fn test_cursor_without_end_cursor_is_terminal() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Cursor, 2);
        sequencer.record_page(
            &PageInfo::Cursor {
                start_cursor: None,
                end_cursor: None,
                has_next_page: true,
                has_previous_page: false,
            },
            true,
        );

        assert!(!sequencer.has_next_page());
    }

    #[test]
    fn test_offset_sequencer() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Offset, 10);
        assert_eq!(
            sequencer.first_page_request(),
            PageRequest::Offset { page: 1, size: 10 }
        );

        sequencer.record_page(
            &PageInfo::Offset {
                current_page: 1,
                total_pages: 3,
                per_page: 10,
            },
            true,
        );
        assert_eq!(
            sequencer.next_page_request(),
            Some(PageRequest::Offset { page: 2, size: 10 })
        );

        sequencer.record_page(
            &PageInfo::Offset {
                current_page: 3,
                total_pages: 3,
                per_page: 10,
            },
            false,
        );
        assert!(sequencer.next_page_request().is_none());
        assert!(sequencer.newest_cursor().is_none());
    }

    #[test]
    fn test_offset_last_representable_page_does_not_overflow() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Offset, 10);
        sequencer.record_page(
            &PageInfo::Offset {
                current_page: u32::MAX,
                total_pages: u32::MAX,
                per_page: 10,
            },
            false,
        );

        assert!(!sequencer.has_next_page());
        assert_eq!(
            sequencer.state(),
            &PaginationState::Offset {
                next_page: u32::MAX,
                has_next_page: false
            }
        );
    }

    #[test]
    fn test_reset_keeps_style() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Offset, 10);
        sequencer.record_page(
            &PageInfo::Offset {
                current_page: 1,
                total_pages: 1,
                per_page: 10,
            },
            true,
        );
        assert!(!sequencer.has_next_page());

        sequencer.reset();

        assert_eq!(sequencer.state(), &PaginationState::new(PaginationStyle::Offset));
    }

    #[test]
    fn test_backend_style_wins() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Offset, 10);
        sequencer.record_page(&cursor_info("a", "b", true), true);

        assert!(matches!(sequencer.state(), PaginationState::Cursor { .. }));
        assert_eq!(sequencer.first_page_request(), PageRequest::Cursor {
            cursor: CursorRequest::First,
            size: 10
        });
    }

    #[test]
    fn test_record_newest_cursor() {
        let mut sequencer = PageSequencer::new(PaginationStyle::Cursor, 10);
        sequencer.record_page(&cursor_info("n5", "n9", true), true);

        sequencer.record_newest_cursor("n1".to_string());

        assert_eq!(sequencer.newest_cursor(), Some("n1"));
        assert_eq!(
            sequencer.previous_page_request("n1"),
            PageRequest::Cursor {
                cursor: CursorRequest::Before("n1".to_string()),
                size: 10
            }
        );
    }

    #[test]
    fn test_merge_append() {
        let mut collection = batch(&["a", "b"]);

        let indexes = merge_page(&mut collection, batch(&["c", "d"]), Placement::Append);

        assert_eq!(indexes, vec![2, 3]);
        assert_eq!(ids(&collection), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merge_prepend() {
        let mut collection = batch(&["c", "d"]);

        let indexes = merge_page(&mut collection, batch(&["a", "b"]), Placement::Prepend);

        assert_eq!(indexes, vec![0, 1]);
        assert_eq!(ids(&collection), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_merge_skips_loaded_ids() {
        let mut collection = batch(&["a", "b"]);

        let indexes = merge_page(&mut collection, batch(&["b", "c", "c"]), Placement::Append);

        assert_eq!(indexes, vec![2]);
        assert_eq!(ids(&collection), vec!["a", "b", "c"]);
    }
}
