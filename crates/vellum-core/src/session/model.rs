//! Browsing session domain model.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::paging::Paging;
use crate::document::{Document, ID_FIELD};
use crate::query::SearchSpec;

/// How the current page of documents is displayed. Display concern only;
/// never consulted when building queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Table,
    Tree,
    Raw,
}

/// Per-collection browsing state.
///
/// A session is created on first navigation into a collection, lives for the
/// lifetime of its tab, and is discarded when the tab closes. Nothing here
/// survives an application restart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowseSession {
    /// Identifier of the collection this session browses.
    pub collection_id: String,
    /// The currently displayed page of documents.
    pub documents: Vec<Document>,
    /// Active display mode.
    pub view_mode: ViewMode,
    /// Pagination state. The variant follows the active search's query plan.
    pub paging: Paging,
    /// Active search specification, if any.
    pub search: Option<SearchSpec>,
    /// Field names observed across all fetched pages, seeded with the
    /// identifier field. Append-only for the session's lifetime; feeds the
    /// search-field chooser and never affects query correctness.
    pub known_fields: BTreeSet<String>,
}

impl BrowseSession {
    /// Creates an empty session positioned at page 1 with no filter.
    pub fn new(collection_id: impl Into<String>) -> Self {
        let mut known_fields = BTreeSet::new();
        known_fields.insert(ID_FIELD.to_string());
        Self {
            collection_id: collection_id.into(),
            documents: Vec::new(),
            view_mode: ViewMode::default(),
            paging: Paging::cursor_start(),
            search: None,
            known_fields,
        }
    }

    /// 1-based page number as presented to the user.
    pub fn page(&self) -> u32 {
        self.paging.page()
    }

    /// Whether a further page may exist.
    pub fn has_next(&self) -> bool {
        self.paging.has_next()
    }

    /// Whether backward navigation is possible.
    pub fn has_prev(&self) -> bool {
        self.paging.has_prev()
    }

    /// Unions the field names of the given documents into the known set.
    /// Fields are never removed, so the search vocabulary only grows.
    pub(crate) fn merge_known_fields(&mut self, documents: &[Document]) {
        for document in documents {
            for key in document.fields.keys() {
                if !self.known_fields.contains(key) {
                    self.known_fields.insert(key.clone());
                }
            }
        }
    }
}
