//! In-memory data-access collaborator.
//!
//! Satisfies the same contract a remote document store does — stable default
//! ordering, opaque continuation cursors, backend-assigned identifiers —
//! while holding everything in process memory. Backs the test suites and
//! doubles as an offline demo backend.

use std::collections::BTreeMap;
use std::ops::Bound;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use vellum_core::document::{Document, FieldMap};
use vellum_core::error::Result;
use vellum_core::source::{DataSource, Filter, FilterOp, QueryPage, QueryRequest};

/// Document store held entirely in memory.
///
/// Collections are `BTreeMap`s keyed by document id, which provides the
/// stable default order the pagination contract requires; cursors are plain
/// document ids resumed with an exclusive lower bound.
#[derive(Default)]
pub struct MemoryDataSource {
    collections: RwLock<BTreeMap<String, BTreeMap<String, FieldMap>>>,
}

impl MemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document directly, creating the collection if needed.
    pub async fn insert(&self, collection: &str, id: &str, fields: FieldMap) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
    }

    /// Number of documents currently stored in a collection.
    pub async fn len(&self, collection: &str) -> usize {
        let collections = self.collections.read().await;
        collections.get(collection).map_or(0, BTreeMap::len)
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn list_collections(&self) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections.keys().cloned().collect())
    }

    async fn get_document(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|documents| documents.get(id))
            .map(|fields| Document::new(id, fields.clone())))
    }

    async fn query_documents(&self, collection: &str, request: QueryRequest) -> Result<QueryPage> {
        let collections = self.collections.read().await;
        let Some(documents) = collections.get(collection) else {
            // Unknown collections read as empty, like the remote store.
            return Ok(QueryPage {
                documents: Vec::new(),
                last_cursor: None,
            });
        };
        let range = match &request.start_after {
            Some(cursor) => {
                documents.range::<str, _>((Bound::Excluded(cursor.as_str()), Bound::Unbounded))
            }
            None => documents.range::<str, _>((Bound::Unbounded, Bound::Unbounded)),
        };

        let mut matched = Vec::new();
        for (id, fields) in range {
            if request
                .limit
                .is_some_and(|limit| matched.len() >= limit)
            {
                break;
            }
            if let Some(filter) = &request.filter {
                if !matches_filter(fields, filter) {
                    continue;
                }
            }
            matched.push(Document::new(id.clone(), fields.clone()));
        }
        let last_cursor = matched.last().map(|document| document.id.clone());
        Ok(QueryPage {
            documents: matched,
            last_cursor,
        })
    }

    async fn set_document(
        &self,
        collection: &str,
        id: Option<&str>,
        fields: FieldMap,
    ) -> Result<String> {
        let id = match id {
            Some(id) => id.to_string(),
            None => Uuid::new_v4().to_string(),
        };
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        tracing::debug!("[MemoryDataSource] set '{}/{}'", collection, id);
        Ok(id)
    }

    async fn delete_document(&self, collection: &str, id: &str) -> Result<()> {
        let mut collections = self.collections.write().await;
        if let Some(documents) = collections.get_mut(collection) {
            documents.remove(id);
        }
        // Deleting a document that never existed succeeds, matching the
        // remote store's semantics.
        Ok(())
    }
}

fn matches_filter(fields: &FieldMap, filter: &Filter) -> bool {
    let actual = fields.get(&filter.field);
    match filter.op {
        FilterOp::Equal => actual.is_some_and(|value| values_equal(value, &filter.value)),
        // A missing field never satisfies an inequality, mirroring the
        // remote store's not-equal semantics.
        FilterOp::NotEqual => actual.is_some_and(|value| !values_equal(value, &filter.value)),
    }
}

/// Numbers compare numerically regardless of integer/float representation;
/// everything else compares structurally.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> FieldMap {
        let Value::Object(fields) = value else {
            panic!("body must be an object");
        };
        fields
    }

    async fn seeded() -> MemoryDataSource {
        let source = MemoryDataSource::new();
        for n in 0..5 {
            source
                .insert("users", &format!("u{n}"), body(json!({ "n": n, "even": n % 2 == 0 })))
                .await;
        }
        source
    }

    #[tokio::test]
    async fn documents_come_back_in_stable_id_order() {
        let source = seeded().await;
        let page = source
            .query_documents("users", QueryRequest::default())
            .await
            .unwrap();
        let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u1", "u2", "u3", "u4"]);
        assert_eq!(page.last_cursor.as_deref(), Some("u4"));
    }

    #[tokio::test]
    async fn cursor_resumes_strictly_after_the_given_id() {
        let source = seeded().await;
        let request = QueryRequest {
            start_after: Some("u1".to_string()),
            limit: Some(2),
            ..QueryRequest::default()
        };
        let page = source.query_documents("users", request).await.unwrap();
        let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["u2", "u3"]);
        assert_eq!(page.last_cursor.as_deref(), Some("u3"));
    }

    #[tokio::test]
    async fn equality_compares_numbers_numerically() {
        let source = MemoryDataSource::new();
        source.insert("t", "a", body(json!({ "x": 2 }))).await;
        source.insert("t", "b", body(json!({ "x": 2.0 }))).await;
        source.insert("t", "c", body(json!({ "x": "2" }))).await;

        let request = QueryRequest {
            filter: Some(Filter {
                field: "x".to_string(),
                op: FilterOp::Equal,
                value: json!(2),
            }),
            ..QueryRequest::default()
        };
        let page = source.query_documents("t", request).await.unwrap();
        let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn not_equal_excludes_documents_missing_the_field() {
        let source = MemoryDataSource::new();
        source.insert("t", "a", body(json!({ "status": "open" }))).await;
        source.insert("t", "b", body(json!({ "status": "done" }))).await;
        source.insert("t", "c", body(json!({ "other": 1 }))).await;

        let request = QueryRequest {
            filter: Some(Filter {
                field: "status".to_string(),
                op: FilterOp::NotEqual,
                value: json!("open"),
            }),
            ..QueryRequest::default()
        };
        let page = source.query_documents("t", request).await.unwrap();
        let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test]
    async fn limit_applies_after_filtering() {
        let source = seeded().await;
        let request = QueryRequest {
            filter: Some(Filter {
                field: "even".to_string(),
                op: FilterOp::Equal,
                value: json!(true),
            }),
            limit: Some(2),
            ..QueryRequest::default()
        };
        let page = source.query_documents("users", request).await.unwrap();
        let ids: Vec<&str> = page.documents.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["u0", "u2"]);
    }

    #[tokio::test]
    async fn set_document_assigns_an_id_when_omitted() {
        let source = MemoryDataSource::new();
        let id = source
            .set_document("users", None, body(json!({ "a": 1 })))
            .await
            .unwrap();
        assert!(!id.is_empty());
        assert!(source.get_document("users", &id).await.unwrap().is_some());

        let explicit = source
            .set_document("users", Some("chosen"), body(json!({ "b": 2 })))
            .await
            .unwrap();
        assert_eq!(explicit, "chosen");
    }

    #[tokio::test]
    async fn set_document_replaces_the_whole_body() {
        let source = MemoryDataSource::new();
        source.insert("t", "a", body(json!({ "x": 1, "y": 2 }))).await;
        source
            .set_document("t", Some("a"), body(json!({ "z": 3 })))
            .await
            .unwrap();

        let doc = source.get_document("t", "a").await.unwrap().unwrap();
        assert_eq!(Value::Object(doc.fields), json!({ "z": 3 }));
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let source = seeded().await;
        source.delete_document("users", "u0").await.unwrap();
        source.delete_document("users", "u0").await.unwrap();
        assert_eq!(source.len("users").await, 4);
        assert!(source.get_document("users", "u0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unknown_collection_reads_as_empty() {
        let source = MemoryDataSource::new();
        let page = source
            .query_documents("ghost", QueryRequest::default())
            .await
            .unwrap();
        assert!(page.documents.is_empty());
        assert!(page.last_cursor.is_none());
        assert!(source.list_collections().await.unwrap().is_empty());
    }
}
