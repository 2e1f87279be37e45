//! Pagination state machines.

use serde::{Deserialize, Serialize};

use crate::source::DocCursor;

/// Pagination state of a browsing session.
///
/// The two variants are distinct state machines: cursor navigation over the
/// backend's default order, and arithmetic offset slicing of a client-filtered
/// result set. A session is always in exactly one regime, selected by the
/// translated query plan, and switches only when the query shape changes —
/// cursors from one regime are meaningless in the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "regime", rename_all = "snake_case")]
pub enum Paging {
    /// Backend cursor navigation.
    Cursor {
        /// Start cursors of every page after the first; the top entry is the
        /// start of the current page. `history.len() + 1` is the page number,
        /// which makes "page 1 iff empty history" structural.
        history: Vec<DocCursor>,
        /// Position the next page would start after. `None` means the last
        /// fetch signalled the end of the result set.
        next: Option<DocCursor>,
    },
    /// Arithmetic slicing of a fully materialized, client-filtered set.
    Offset {
        /// 1-based page number.
        page: u32,
        /// Whether the current slice ended before the end of the filtered set.
        has_next: bool,
    },
}

impl Paging {
    /// Fresh cursor-regime state positioned at page 1.
    pub fn cursor_start() -> Self {
        Self::Cursor {
            history: Vec::new(),
            next: None,
        }
    }

    /// Fresh offset-regime state positioned at page 1.
    pub fn offset_start() -> Self {
        Self::Offset {
            page: 1,
            has_next: false,
        }
    }

    /// 1-based page number as presented to the user.
    pub fn page(&self) -> u32 {
        match self {
            Self::Cursor { history, .. } => history.len() as u32 + 1,
            Self::Offset { page, .. } => *page,
        }
    }

    /// Whether a further page may exist. A hint, not a guarantee: the backend
    /// may still return zero additional documents.
    pub fn has_next(&self) -> bool {
        match self {
            Self::Cursor { next, .. } => next.is_some(),
            Self::Offset { has_next, .. } => *has_next,
        }
    }

    /// Whether backward navigation is possible.
    pub fn has_prev(&self) -> bool {
        self.page() > 1
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self::cursor_start()
    }
}
