//! Document domain model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Name of the reserved identifier field.
///
/// The identifier is not stored inside a document's body; this name exists so
/// the search UI can offer "search by id" next to the real fields.
pub const ID_FIELD: &str = "_id";

/// Ordered mapping of field names to values.
///
/// Insertion order is preserved (`serde_json/preserve_order`), which keeps a
/// document's body stable through the draft editor's round trips.
pub type FieldMap = serde_json::Map<String, Value>;

/// A single document of a schemaless collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Backend-assigned document identifier.
    pub id: String,
    /// The document body, excluding the identifier.
    pub fields: FieldMap,
}

impl Document {
    /// Creates a document from an id and a body.
    pub fn new(id: impl Into<String>, fields: FieldMap) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }
}
