//! Data-access collaborator contract.
//!
//! The engine never talks to a document store directly; everything goes
//! through [`DataSource`], decoupling the browsing logic from the specific
//! backend (a remote document database, an in-memory store in tests).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::{Document, FieldMap};
use crate::error::Result;

/// Opaque continuation token marking the position after which the next page
/// of a query should start. Only the backend interprets its contents.
pub type DocCursor = String;

/// Filter operators the backend evaluates server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Equal,
    /// Inequality. Documents missing the field do not match.
    NotEqual,
}

/// A server-side filter descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// Parameters of a single [`DataSource::query_documents`] call.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    /// Server-side filter, if any.
    pub filter: Option<Filter>,
    /// Return documents strictly after this position in the backend's
    /// default order.
    pub start_after: Option<DocCursor>,
    /// Maximum number of documents to return. `None` means unbounded.
    pub limit: Option<usize>,
}

/// One batch of query results.
#[derive(Debug, Clone)]
pub struct QueryPage {
    /// Documents in the backend's stable default order.
    pub documents: Vec<Document>,
    /// Position of the last returned document, usable as `start_after` for
    /// the following batch. This is a hint: it may be `Some` even when no
    /// further documents exist.
    pub last_cursor: Option<DocCursor>,
}

/// Asynchronous access to a schemaless document store.
///
/// All calls may fail; failures surface a message string and never a partial
/// result. Implementations must keep a stable default document order so that
/// cursor pagination is meaningful.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Lists the identifiers of the top-level collections.
    async fn list_collections(&self) -> Result<Vec<String>>;

    /// Fetches a single document by id.
    ///
    /// Returns `Ok(None)` when the document does not exist; a miss is not a
    /// fault.
    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>>;

    /// Executes a query against one collection.
    async fn query_documents(&self, collection: &str, request: QueryRequest) -> Result<QueryPage>;

    /// Creates or replaces a document.
    ///
    /// When `id` is `None` the backend assigns one. Returns the id the
    /// document ended up under.
    async fn set_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: FieldMap,
    ) -> Result<String>;

    /// Deletes a document. Deleting a document that does not exist succeeds.
    async fn delete_document(&self, collection: &str, id: &str) -> Result<()>;
}
