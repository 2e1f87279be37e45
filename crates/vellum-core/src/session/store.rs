//! Session store: owns per-collection sessions and mediates every state
//! transition as one atomic operation.
//!
//! A transition clones the session, applies the change and the fetch to the
//! clone, and only swaps it back in once the data-access collaborator has
//! answered. A failed fetch therefore leaves the session at its last-known
//! good state. The session's lock is held across the await, which is also
//! the single-flight guard: no two fetches for one collection can overlap,
//! while distinct collections stay independent.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use super::model::{BrowseSession, ViewMode};
use super::paging::Paging;
use crate::config::EngineConfig;
use crate::document::Document;
use crate::error::{Result, VellumError};
use crate::query::{QueryPlan, SearchSpec};
use crate::source::{DataSource, Filter, QueryRequest};

/// Direction of a user-initiated page change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Next,
    Prev,
}

/// Page transition applied by a fetch. `Reset` is used whenever the query
/// shape changes (open, search change, refresh) and always lands on page 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PageMove {
    Reset,
    Next,
    Prev,
}

impl From<PageDirection> for PageMove {
    fn from(direction: PageDirection) -> Self {
        match direction {
            PageDirection::Next => Self::Next,
            PageDirection::Prev => Self::Prev,
        }
    }
}

#[derive(Default)]
struct Registry {
    sessions: HashMap<String, Arc<Mutex<BrowseSession>>>,
    /// Collection ids in the order their tabs were opened.
    order: Vec<String>,
    active: Option<String>,
}

/// Owns the map from collection id to [`BrowseSession`] and runs all
/// transitions against the data-access collaborator.
pub struct SessionStore {
    source: Arc<dyn DataSource>,
    config: EngineConfig,
    registry: RwLock<Registry>,
}

impl SessionStore {
    /// Creates a store over the given collaborator.
    pub fn new(source: Arc<dyn DataSource>, config: EngineConfig) -> Self {
        Self {
            source,
            config: config.sanitized(),
            registry: RwLock::new(Registry::default()),
        }
    }

    /// Opens a session for `collection_id`, or switches focus to it when a
    /// session already exists. Switching focus never refetches.
    ///
    /// A fresh session performs its initial load; if that load fails the
    /// session stays open showing an empty first page and the error is
    /// reported to the caller.
    pub async fn open_session(&self, collection_id: &str) -> Result<BrowseSession> {
        let existing = {
            let mut registry = self.registry.write().await;
            let found = registry.sessions.get(collection_id).cloned();
            registry.active = Some(collection_id.to_string());
            if found.is_none() {
                let handle = Arc::new(Mutex::new(BrowseSession::new(collection_id)));
                registry
                    .sessions
                    .insert(collection_id.to_string(), handle);
                registry.order.push(collection_id.to_string());
            }
            found
        };
        if let Some(handle) = existing {
            let session = handle.lock().await;
            return Ok(session.clone());
        }
        tracing::debug!("[SessionStore] opening session for '{}'", collection_id);
        self.transition(collection_id, |_| {}, PageMove::Reset)
            .await
    }

    /// Closes a session, discarding all of its state. When the active
    /// session is closed, the most recently opened remaining one (if any)
    /// becomes active.
    pub async fn close_session(&self, collection_id: &str) {
        let mut registry = self.registry.write().await;
        registry.sessions.remove(collection_id);
        registry.order.retain(|id| id != collection_id);
        if registry.active.as_deref() == Some(collection_id) {
            registry.active = registry.order.last().cloned();
        }
    }

    /// Snapshot of the active session, if any.
    pub async fn active_session(&self) -> Option<BrowseSession> {
        let handle = {
            let registry = self.registry.read().await;
            let active = registry.active.clone()?;
            registry.sessions.get(&active).cloned()?
        };
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Identifier of the active collection, if any.
    pub async fn active_collection(&self) -> Option<String> {
        self.registry.read().await.active.clone()
    }

    /// Snapshot of one session, if open.
    pub async fn session(&self, collection_id: &str) -> Option<BrowseSession> {
        let handle = {
            let registry = self.registry.read().await;
            registry.sessions.get(collection_id).cloned()?
        };
        let session = handle.lock().await;
        Some(session.clone())
    }

    /// Open collection ids in tab order.
    pub async fn open_collections(&self) -> Vec<String> {
        self.registry.read().await.order.clone()
    }

    /// Activates, changes or clears the search of a session and reloads it
    /// from page 1. On failure the previous search and page stay in place.
    pub async fn set_search(
        &self,
        collection_id: &str,
        search: Option<SearchSpec>,
    ) -> Result<BrowseSession> {
        self.transition(
            collection_id,
            move |session| session.search = search,
            PageMove::Reset,
        )
        .await
    }

    /// Navigates one page forward or backward. Requesting an unavailable
    /// page is a no-op that returns the current state.
    pub async fn paginate(
        &self,
        collection_id: &str,
        direction: PageDirection,
    ) -> Result<BrowseSession> {
        self.transition(collection_id, |_| {}, direction.into()).await
    }

    /// Re-runs the current query shape from page 1.
    pub async fn refresh(&self, collection_id: &str) -> Result<BrowseSession> {
        self.transition(collection_id, |_| {}, PageMove::Reset).await
    }

    /// Switches the display mode. No fetch is involved.
    pub async fn set_view_mode(&self, collection_id: &str, view_mode: ViewMode) -> Result<()> {
        let handle = self.handle(collection_id).await?;
        let mut session = handle.lock().await;
        session.view_mode = view_mode;
        Ok(())
    }

    async fn handle(&self, collection_id: &str) -> Result<Arc<Mutex<BrowseSession>>> {
        let registry = self.registry.read().await;
        registry
            .sessions
            .get(collection_id)
            .cloned()
            .ok_or_else(|| VellumError::not_found("session", collection_id))
    }

    /// Runs one atomic transition: mutate a copy, fetch into it, swap it in.
    async fn transition<F>(
        &self,
        collection_id: &str,
        mutate: F,
        page_move: PageMove,
    ) -> Result<BrowseSession>
    where
        F: FnOnce(&mut BrowseSession),
    {
        let handle = self.handle(collection_id).await?;
        let mut session = handle.lock().await;
        let mut candidate = session.clone();
        mutate(&mut candidate);
        self.fetch_into(&mut candidate, page_move).await?;
        *session = candidate.clone();
        Ok(candidate)
    }

    async fn fetch_into(&self, session: &mut BrowseSession, page_move: PageMove) -> Result<()> {
        match QueryPlan::for_search(session.search.as_ref()) {
            QueryPlan::DirectLookup { id } => self.fetch_direct(session, &id, page_move).await,
            QueryPlan::ClientSubstring { field, needle } => {
                self.fetch_substring_page(session, &field, &needle, page_move)
                    .await
            }
            QueryPlan::Unfiltered => self.fetch_cursor_page(session, None, page_move).await,
            QueryPlan::ServerFilter(filter) => {
                self.fetch_cursor_page(session, Some(filter), page_move).await
            }
        }
    }

    /// Direct identifier lookup. Pagination does not apply: the result is at
    /// most one document and the outgoing cursor is forced to null, so
    /// next/prev requests are inert until the search changes.
    async fn fetch_direct(
        &self,
        session: &mut BrowseSession,
        id: &str,
        page_move: PageMove,
    ) -> Result<()> {
        if page_move != PageMove::Reset {
            return Ok(());
        }
        let documents: Vec<Document> = self
            .source
            .get_document(&session.collection_id, id)
            .await?
            .into_iter()
            .collect();
        session.merge_known_fields(&documents);
        session.documents = documents;
        session.paging = Paging::cursor_start();
        Ok(())
    }

    /// Cursor-regime fetch: one page in the backend's default order,
    /// starting after the top of the history stack.
    async fn fetch_cursor_page(
        &self,
        session: &mut BrowseSession,
        filter: Option<Filter>,
        page_move: PageMove,
    ) -> Result<()> {
        let (history, next) = match &session.paging {
            Paging::Cursor { history, next } => (history.clone(), next.clone()),
            // Regime switch; only reachable through a Reset.
            Paging::Offset { .. } => (Vec::new(), None),
        };
        let history = match page_move {
            PageMove::Reset => Vec::new(),
            PageMove::Next => {
                let Some(cursor) = next else {
                    tracing::debug!(
                        "[SessionStore] no next page for '{}'",
                        session.collection_id
                    );
                    return Ok(());
                };
                let mut history = history;
                history.push(cursor);
                history
            }
            PageMove::Prev => {
                if history.is_empty() {
                    return Ok(());
                }
                let mut history = history;
                history.pop();
                history
            }
        };
        let request = QueryRequest {
            filter,
            start_after: history.last().cloned(),
            limit: Some(self.config.page_size),
        };
        let page = self
            .source
            .query_documents(&session.collection_id, request)
            .await?;
        // A short page signals the end of the result set; a full page keeps
        // the backend's cursor as the hint for one more fetch.
        let next = if page.documents.len() >= self.config.page_size {
            page.last_cursor
        } else {
            None
        };
        session.merge_known_fields(&page.documents);
        session.documents = page.documents;
        session.paging = Paging::Cursor { history, next };
        Ok(())
    }

    /// Offset-regime fetch: the backend has no substring support, so the
    /// whole collection is fetched, filtered here, and sliced by page
    /// arithmetic. The filtered set is recomputed on every fetch.
    async fn fetch_substring_page(
        &self,
        session: &mut BrowseSession,
        field: &str,
        needle: &str,
        page_move: PageMove,
    ) -> Result<()> {
        let (current_page, has_next) = match &session.paging {
            Paging::Offset { page, has_next } => (*page, *has_next),
            // Regime switch; only reachable through a Reset.
            Paging::Cursor { .. } => (1, false),
        };
        let page = match page_move {
            PageMove::Reset => 1,
            PageMove::Next => {
                if !has_next {
                    return Ok(());
                }
                current_page + 1
            }
            PageMove::Prev => {
                if current_page <= 1 {
                    return Ok(());
                }
                current_page - 1
            }
        };
        let request = QueryRequest {
            filter: None,
            start_after: None,
            limit: None,
        };
        let result = self
            .source
            .query_documents(&session.collection_id, request)
            .await?;
        let needle = needle.to_lowercase();
        let filtered: Vec<Document> = result
            .documents
            .into_iter()
            .filter(|document| {
                document
                    .fields
                    .get(field)
                    .and_then(Value::as_str)
                    .is_some_and(|value| value.to_lowercase().contains(&needle))
            })
            .collect();
        let page_size = self.config.page_size;
        let start = (page as usize - 1) * page_size;
        let end = (start + page_size).min(filtered.len());
        let has_next = start + page_size < filtered.len();
        let documents = if start < filtered.len() {
            filtered[start..end].to_vec()
        } else {
            Vec::new()
        };
        session.merge_known_fields(&documents);
        session.documents = documents;
        session.paging = Paging::Offset { page, has_next };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{FieldMap, ID_FIELD};
    use crate::query::SearchOperator;
    use crate::source::{FilterOp, QueryPage};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    fn doc(id: &str, body: Value) -> Document {
        let Value::Object(fields) = body else {
            panic!("document body must be an object");
        };
        Document::new(id, fields)
    }

    fn numbered_docs(count: usize) -> Vec<Document> {
        (0..count)
            .map(|n| doc(&format!("doc-{n:03}"), json!({ "n": n })))
            .collect()
    }

    fn ids(session: &BrowseSession) -> Vec<String> {
        session.documents.iter().map(|d| d.id.clone()).collect()
    }

    /// Fixed document set with cursor/filter semantics and call counting.
    struct FixtureSource {
        documents: Vec<Document>,
        query_calls: AtomicUsize,
        fail: AtomicBool,
    }

    impl FixtureSource {
        fn new(documents: Vec<Document>) -> Self {
            Self {
                documents,
                query_calls: AtomicUsize::new(0),
                fail: AtomicBool::new(false),
            }
        }

        fn set_failing(&self, failing: bool) {
            self.fail.store(failing, Ordering::SeqCst);
        }

        fn query_count(&self) -> usize {
            self.query_calls.load(Ordering::SeqCst)
        }

        fn check_fail(&self) -> Result<()> {
            if self.fail.load(Ordering::SeqCst) {
                Err(VellumError::backend("connection lost"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DataSource for FixtureSource {
        async fn list_collections(&self) -> Result<Vec<String>> {
            self.check_fail()?;
            Ok(vec!["fixture".to_string()])
        }

        async fn get_document(&self, _collection: &str, id: &str) -> Result<Option<Document>> {
            self.check_fail()?;
            Ok(self.documents.iter().find(|d| d.id == id).cloned())
        }

        async fn query_documents(
            &self,
            _collection: &str,
            request: QueryRequest,
        ) -> Result<QueryPage> {
            self.check_fail()?;
            self.query_calls.fetch_add(1, Ordering::SeqCst);
            let mut documents: Vec<Document> = self
                .documents
                .iter()
                .filter(|d| match &request.filter {
                    None => true,
                    Some(filter) => {
                        let actual = d.fields.get(&filter.field);
                        match filter.op {
                            FilterOp::Equal => actual == Some(&filter.value),
                            FilterOp::NotEqual => {
                                actual.is_some_and(|value| value != &filter.value)
                            }
                        }
                    }
                })
                .cloned()
                .collect();
            if let Some(cursor) = &request.start_after {
                if let Some(position) = documents.iter().position(|d| &d.id == cursor) {
                    documents.drain(..=position);
                }
            }
            if let Some(limit) = request.limit {
                documents.truncate(limit);
            }
            let last_cursor = documents.last().map(|d| d.id.clone());
            Ok(QueryPage {
                documents,
                last_cursor,
            })
        }

        async fn set_document(
            &self,
            _collection: &str,
            _id: Option<&str>,
            _fields: FieldMap,
        ) -> Result<String> {
            Err(VellumError::internal("not supported by the fixture"))
        }

        async fn delete_document(&self, _collection: &str, _id: &str) -> Result<()> {
            Err(VellumError::internal("not supported by the fixture"))
        }
    }

    fn store_with(documents: Vec<Document>, page_size: usize) -> (Arc<FixtureSource>, SessionStore) {
        let source = Arc::new(FixtureSource::new(documents));
        let store = SessionStore::new(source.clone(), EngineConfig { page_size });
        (source, store)
    }

    fn assert_page_invariant(session: &BrowseSession) {
        if let Paging::Cursor { history, .. } = &session.paging {
            assert_eq!(session.page() == 1, history.is_empty());
        }
    }

    #[tokio::test]
    async fn open_session_fetches_the_first_page() {
        let (_, store) = store_with(numbered_docs(150), 100);
        let session = store.open_session("users").await.unwrap();
        assert_eq!(session.documents.len(), 100);
        assert_eq!(session.page(), 1);
        assert!(session.has_next());
        assert!(!session.has_prev());
        assert_page_invariant(&session);
    }

    #[tokio::test]
    async fn forward_then_backward_returns_to_the_same_page() {
        let (_, store) = store_with(numbered_docs(150), 100);
        let first = store.open_session("users").await.unwrap();
        let first_ids = ids(&first);

        let second = store.paginate("users", PageDirection::Next).await.unwrap();
        assert_eq!(second.documents.len(), 50);
        assert_eq!(second.page(), 2);
        assert!(!second.has_next());
        assert_page_invariant(&second);

        let back = store.paginate("users", PageDirection::Prev).await.unwrap();
        assert_eq!(back.page(), 1);
        assert_eq!(ids(&back), first_ids);
        assert_page_invariant(&back);
    }

    #[tokio::test]
    async fn deep_round_trip_revisits_identical_pages() {
        let (_, store) = store_with(numbered_docs(250), 100);
        let mut forward = vec![ids(&store.open_session("users").await.unwrap())];
        for _ in 0..2 {
            forward.push(ids(&store.paginate("users", PageDirection::Next).await.unwrap()));
        }
        assert_eq!(forward[2].len(), 50);

        let back2 = store.paginate("users", PageDirection::Prev).await.unwrap();
        assert_eq!(ids(&back2), forward[1]);
        let back1 = store.paginate("users", PageDirection::Prev).await.unwrap();
        assert_eq!(ids(&back1), forward[0]);
        assert_eq!(back1.page(), 1);
    }

    #[tokio::test]
    async fn pagination_at_the_edges_is_a_noop() {
        let (source, store) = store_with(numbered_docs(30), 100);
        let session = store.open_session("users").await.unwrap();
        assert!(!session.has_next());
        let calls = source.query_count();

        let after_next = store.paginate("users", PageDirection::Next).await.unwrap();
        assert_eq!(ids(&after_next), ids(&session));
        let after_prev = store.paginate("users", PageDirection::Prev).await.unwrap();
        assert_eq!(ids(&after_prev), ids(&session));
        // Neither edge move should have touched the backend.
        assert_eq!(source.query_count(), calls);
    }

    #[tokio::test]
    async fn full_page_at_collection_end_yields_one_empty_page() {
        let (_, store) = store_with(numbered_docs(100), 100);
        let first = store.open_session("users").await.unwrap();
        // The cursor is a hint: the backend returned a full page, so a next
        // page may exist even though the collection is exhausted.
        assert!(first.has_next());

        let second = store.paginate("users", PageDirection::Next).await.unwrap();
        assert!(second.documents.is_empty());
        assert_eq!(second.page(), 2);
        assert!(!second.has_next());

        let back = store.paginate("users", PageDirection::Prev).await.unwrap();
        assert_eq!(ids(&back), ids(&first));
        assert_eq!(back.page(), 1);
    }

    #[tokio::test]
    async fn substring_pages_concatenate_to_the_full_filtered_set() {
        let documents: Vec<Document> = (0..10)
            .map(|n| {
                let name = if n % 2 == 0 {
                    format!("Anders-{n}")
                } else {
                    format!("Bruno-{n}")
                };
                doc(&format!("doc-{n:03}"), json!({ "name": name }))
            })
            .collect();
        let (_, store) = store_with(documents, 2);
        store.open_session("users").await.unwrap();

        let spec = SearchSpec::new("name", SearchOperator::Like, "and");
        let mut session = store.set_search("users", Some(spec)).await.unwrap();
        assert!(matches!(session.paging, Paging::Offset { .. }));
        assert_eq!(session.page(), 1);

        let mut collected = ids(&session);
        while session.has_next() {
            session = store.paginate("users", PageDirection::Next).await.unwrap();
            collected.extend(ids(&session));
        }
        // Five "Anders-*" documents, two per page, no duplicates or holes.
        assert_eq!(
            collected,
            vec!["doc-000", "doc-002", "doc-004", "doc-006", "doc-008"]
        );
        assert_eq!(session.page(), 3);

        // Walk back to page 1.
        while session.has_prev() {
            session = store.paginate("users", PageDirection::Prev).await.unwrap();
        }
        assert_eq!(ids(&session), vec!["doc-000", "doc-002"]);
    }

    #[tokio::test]
    async fn substring_match_is_case_insensitive() {
        let documents = vec![
            doc("a", json!({ "name": "Anna" })),
            doc("b", json!({ "name": "Bob" })),
            doc("c", json!({ "name": "Diana" })),
        ];
        let (_, store) = store_with(documents, 100);
        store.open_session("users").await.unwrap();

        for needle in ["an", "AN"] {
            let spec = SearchSpec::new("name", SearchOperator::Like, needle);
            let session = store.set_search("users", Some(spec)).await.unwrap();
            assert_eq!(ids(&session), vec!["a", "c"]);
        }
    }

    #[tokio::test]
    async fn substring_ignores_non_string_fields() {
        let documents = vec![
            doc("a", json!({ "name": 42 })),
            doc("b", json!({ "name": "42nd street" })),
            doc("c", json!({ "other": "42" })),
        ];
        let (_, store) = store_with(documents, 100);
        store.open_session("users").await.unwrap();

        let spec = SearchSpec::new("name", SearchOperator::Like, "42");
        let session = store.set_search("users", Some(spec)).await.unwrap();
        assert_eq!(ids(&session), vec!["b"]);
    }

    #[tokio::test]
    async fn changing_the_search_resets_pagination() {
        let (_, store) = store_with(numbered_docs(250), 100);
        store.open_session("users").await.unwrap();
        store.paginate("users", PageDirection::Next).await.unwrap();

        let spec = SearchSpec::new("n", SearchOperator::NotEqual, "0");
        let session = store.set_search("users", Some(spec.clone())).await.unwrap();
        assert_eq!(session.page(), 1);
        assert_eq!(session.search, Some(spec));
        assert_page_invariant(&session);

        let cleared = store.set_search("users", None).await.unwrap();
        assert_eq!(cleared.page(), 1);
        assert_eq!(cleared.search, None);
        assert_eq!(cleared.documents.len(), 100);
    }

    #[tokio::test]
    async fn equality_filter_coerces_numeric_values() {
        let (_, store) = store_with(numbered_docs(10), 100);
        store.open_session("users").await.unwrap();

        let spec = SearchSpec::new("n", SearchOperator::Equal, "3");
        let session = store.set_search("users", Some(spec)).await.unwrap();
        assert_eq!(ids(&session), vec!["doc-003"]);
    }

    #[tokio::test]
    async fn direct_lookup_returns_at_most_one_document() {
        let (source, store) = store_with(numbered_docs(10), 100);
        store.open_session("users").await.unwrap();

        let spec = SearchSpec::new(ID_FIELD, SearchOperator::Like, "doc-005");
        let session = store.set_search("users", Some(spec)).await.unwrap();
        assert_eq!(ids(&session), vec!["doc-005"]);
        assert!(!session.has_next());
        assert!(!session.has_prev());

        // Pagination is inert while the lookup is active.
        let calls = source.query_count();
        let after = store.paginate("users", PageDirection::Next).await.unwrap();
        assert_eq!(ids(&after), vec!["doc-005"]);
        assert_eq!(source.query_count(), calls);
    }

    #[tokio::test]
    async fn direct_lookup_miss_is_an_empty_result() {
        let (_, store) = store_with(numbered_docs(10), 100);
        store.open_session("users").await.unwrap();

        let spec = SearchSpec::new(ID_FIELD, SearchOperator::Equal, "missing");
        let session = store.set_search("users", Some(spec)).await.unwrap();
        assert!(session.documents.is_empty());
        assert!(!session.has_next());
    }

    #[tokio::test]
    async fn failed_fetch_leaves_the_session_untouched() {
        let (source, store) = store_with(numbered_docs(150), 100);
        let before = store.open_session("users").await.unwrap();

        source.set_failing(true);
        let err = store
            .paginate("users", PageDirection::Next)
            .await
            .unwrap_err();
        assert!(err.is_backend());
        let spec = SearchSpec::new("n", SearchOperator::Equal, "1");
        assert!(store.set_search("users", Some(spec)).await.is_err());

        let after = store.session("users").await.unwrap();
        assert_eq!(after, before);

        // The session recovers once the backend does.
        source.set_failing(false);
        let next = store.paginate("users", PageDirection::Next).await.unwrap();
        assert_eq!(next.page(), 2);
        assert_eq!(next.documents.len(), 50);
    }

    #[tokio::test]
    async fn reopening_a_collection_switches_focus_without_refetching() {
        let (source, store) = store_with(numbered_docs(10), 100);
        store.open_session("users").await.unwrap();
        store.open_session("orders").await.unwrap();
        let calls = source.query_count();

        let session = store.open_session("users").await.unwrap();
        assert_eq!(session.collection_id, "users");
        assert_eq!(source.query_count(), calls);
        assert_eq!(store.active_collection().await.as_deref(), Some("users"));
    }

    #[tokio::test]
    async fn closing_the_active_session_falls_back_to_the_last_opened() {
        let (_, store) = store_with(numbered_docs(5), 100);
        store.open_session("a").await.unwrap();
        store.open_session("b").await.unwrap();
        store.open_session("c").await.unwrap();
        assert_eq!(store.open_collections().await, vec!["a", "b", "c"]);

        store.close_session("c").await;
        assert_eq!(store.active_collection().await.as_deref(), Some("b"));

        // Closing an inactive session keeps the focus where it is.
        store.close_session("a").await;
        assert_eq!(store.active_collection().await.as_deref(), Some("b"));

        store.close_session("b").await;
        assert_eq!(store.active_collection().await, None);
        assert!(store.active_session().await.is_none());
    }

    #[tokio::test]
    async fn known_fields_accumulate_across_pages_and_searches() {
        let documents = vec![
            doc("a", json!({ "name": "x" })),
            doc("b", json!({ "email": "y" })),
            doc("c", json!({ "age": 3 })),
        ];
        let (_, store) = store_with(documents, 2);
        let first = store.open_session("users").await.unwrap();
        assert!(first.known_fields.contains("name"));
        assert!(first.known_fields.contains("email"));

        let second = store.paginate("users", PageDirection::Next).await.unwrap();
        assert!(second.known_fields.contains("age"));

        // Narrowing the results must not shrink the vocabulary.
        let spec = SearchSpec::new("name", SearchOperator::Equal, "x");
        let filtered = store.set_search("users", Some(spec)).await.unwrap();
        for field in [ID_FIELD, "name", "email", "age"] {
            assert!(filtered.known_fields.contains(field));
        }
    }

    #[tokio::test]
    async fn refresh_keeps_the_filter_but_resets_the_page() {
        let documents: Vec<Document> = (0..5)
            .map(|n| doc(&format!("d{n}"), json!({ "kind": "widget" })))
            .collect();
        let (_, store) = store_with(documents, 2);
        store.open_session("parts").await.unwrap();

        let spec = SearchSpec::new("kind", SearchOperator::Like, "wid");
        store.set_search("parts", Some(spec.clone())).await.unwrap();
        store.paginate("parts", PageDirection::Next).await.unwrap();

        let refreshed = store.refresh("parts").await.unwrap();
        assert_eq!(refreshed.page(), 1);
        assert_eq!(refreshed.search, Some(spec));
        assert_eq!(refreshed.documents.len(), 2);
    }

    #[tokio::test]
    async fn operations_on_unknown_sessions_fail_with_not_found() {
        let (_, store) = store_with(Vec::new(), 100);
        let err = store.refresh("ghost").await.unwrap_err();
        assert!(err.is_not_found());
        let err = store
            .paginate("ghost", PageDirection::Next)
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn view_mode_is_per_session() {
        let (_, store) = store_with(numbered_docs(1), 100);
        store.open_session("a").await.unwrap();
        store.open_session("b").await.unwrap();

        store.set_view_mode("a", ViewMode::Tree).await.unwrap();
        assert_eq!(
            store.session("a").await.unwrap().view_mode,
            ViewMode::Tree
        );
        assert_eq!(
            store.session("b").await.unwrap().view_mode,
            ViewMode::Table
        );
    }
}
