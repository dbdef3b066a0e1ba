//! Cursor-based paging shapes shared by every paged collaborator.

use serde::{Deserialize, Serialize};

/// One page of results from a paged API.
///
/// A present `cursor` means more pages follow; `None` ends the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}

impl<T> Page<T> {
    /// A page with more results after it.
    pub fn more(items: Vec<T>, cursor: impl Into<String>) -> Self {
        Self {
            items,
            cursor: Some(cursor.into()),
        }
    }

    /// The final page.
    pub fn last(items: Vec<T>) -> Self {
        Self { items, cursor: None }
    }
}

/// A request descriptor that can carry a continuation token.
pub trait Cursor {
    /// Merges the previous page's cursor into this request.
    fn set_cursor(&mut self, cursor: String);
}
