//! Translation of search specifications into execution strategies.

use serde_json::Value;

use super::model::{SearchOperator, SearchSpec};
use crate::document::ID_FIELD;
use crate::source::{Filter, FilterOp};

/// The execution strategy derived from a search specification.
///
/// The pagination regime follows from the plan, never from raw UI state, so
/// the two regimes cannot disagree about what is being executed.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryPlan {
    /// No filtering: plain collection scan in the backend's default order.
    Unfiltered,
    /// Resolve a single document by identifier. The operator is ignored and
    /// pagination does not apply; at most one document comes back.
    DirectLookup { id: String },
    /// Filtering delegated to the backend.
    ServerFilter(Filter),
    /// Substring containment, emulated by fetching the unfiltered collection
    /// and retaining string fields that contain the needle case-insensitively.
    ClientSubstring { field: String, needle: String },
}

impl QueryPlan {
    /// Translates a search specification.
    ///
    /// A missing spec or an empty search value means no filter. The reserved
    /// identifier field short-circuits into a direct lookup with the raw,
    /// uncoerced value, regardless of the chosen operator.
    pub fn for_search(spec: Option<&SearchSpec>) -> Self {
        let Some(spec) = spec else {
            return Self::Unfiltered;
        };
        if spec.value.is_empty() {
            return Self::Unfiltered;
        }
        if spec.field == ID_FIELD {
            return Self::DirectLookup {
                id: spec.value.clone(),
            };
        }
        match spec.operator {
            SearchOperator::Like => Self::ClientSubstring {
                field: spec.field.clone(),
                needle: spec.value.clone(),
            },
            SearchOperator::Equal => Self::ServerFilter(Filter {
                field: spec.field.clone(),
                op: FilterOp::Equal,
                value: coerce_value(&spec.value),
            }),
            SearchOperator::NotEqual => Self::ServerFilter(Filter {
                field: spec.field.clone(),
                op: FilterOp::NotEqual,
                value: coerce_value(&spec.value),
            }),
        }
    }

    /// True when this plan paginates by arithmetic offset instead of cursors.
    pub fn is_offset_regime(&self) -> bool {
        matches!(self, Self::ClientSubstring { .. })
    }
}

/// Converts a raw search value into a filter value.
///
/// A string that parses fully as a finite number becomes numeric, so equality
/// against numeric fields behaves the way users expect; anything else stays a
/// string. Substring searches never coerce (the caller does not get here for
/// those).
fn coerce_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    if let Ok(int) = trimmed.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = trimmed.parse::<f64>() {
        if float.is_finite() {
            if let Some(number) = serde_json::Number::from_f64(float) {
                return Value::Number(number);
            }
        }
    }
    Value::String(raw.to_string())
}
