//! Search specification models.

use serde::{Deserialize, Serialize};

/// Search operators selectable in the search bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SearchOperator {
    /// Exact equality (`==`).
    #[default]
    Equal,
    /// Inequality (`<>`), mapped to the store's not-equal operator.
    NotEqual,
    /// Case-insensitive substring containment (`LIKE`). No backend support;
    /// emulated client-side.
    Like,
}

impl SearchOperator {
    /// Parses the operator symbol shown in the UI.
    ///
    /// Anything unrecognized is treated as equality.
    pub fn parse(symbol: &str) -> Self {
        match symbol {
            "<>" => Self::NotEqual,
            "LIKE" => Self::Like,
            _ => Self::Equal,
        }
    }

    /// The symbol shown in the UI.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "<>",
            Self::Like => "LIKE",
        }
    }
}

/// A user search specification over one field of a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchSpec {
    /// Field to match, or the reserved identifier field.
    pub field: String,
    pub operator: SearchOperator,
    /// Raw value text as typed. Coercion happens at translation time.
    pub value: String,
}

impl SearchSpec {
    pub fn new(
        field: impl Into<String>,
        operator: SearchOperator,
        value: impl Into<String>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}
