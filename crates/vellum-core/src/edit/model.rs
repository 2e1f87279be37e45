//! Draft editing domain model.

use serde::{Deserialize, Serialize};

/// One editable key/value row of a draft document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRow {
    /// Field name. Rows with an empty (trimmed) key are kept in the editor
    /// but excluded from the document body.
    pub key: String,
    /// Raw value text exactly as typed. Parsed as JSON on synchronization,
    /// with a plain-string fallback.
    pub value: String,
}

impl FieldRow {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// What a draft will write when committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DraftTarget {
    /// A document that does not exist yet. The id is optional; the backend
    /// assigns one when left blank.
    New { id: Option<String> },
    /// An existing document addressed by its immutable id.
    Existing { id: String },
}

impl DraftTarget {
    /// The id this draft would be written under, when already determined.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::New { id } => id.as_deref(),
            Self::Existing { id } => Some(id),
        }
    }

    /// Whether this draft edits a document that already exists.
    pub fn is_existing(&self) -> bool {
        matches!(self, Self::Existing { .. })
    }
}
