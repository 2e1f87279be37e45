//! The UI-facing facade over the session store, the draft editor and the
//! data-access collaborator.

use std::sync::Arc;

use tokio::sync::RwLock;

use vellum_core::config::EngineConfig;
use vellum_core::document::Document;
use vellum_core::edit::{DraftEditor, DraftTarget, FieldRow};
use vellum_core::error::{Result, VellumError};
use vellum_core::query::SearchSpec;
use vellum_core::session::{BrowseSession, PageDirection, SessionStore, ViewMode};
use vellum_core::source::DataSource;

/// A draft bound to the collection it will be written to, so the dialog
/// survives the user switching tabs underneath it.
struct ActiveDraft {
    collection_id: String,
    editor: DraftEditor,
}

/// Orchestrates browsing and editing for the UI.
///
/// `Workbench` owns the [`SessionStore`] and the modal draft state and wires
/// both to the data-access collaborator. All methods take `&self`; per-
/// session serialization is enforced by the store, and the draft is guarded
/// by its own lock since at most one dialog is open at a time.
pub struct Workbench {
    source: Arc<dyn DataSource>,
    store: SessionStore,
    draft: RwLock<Option<ActiveDraft>>,
}

impl Workbench {
    /// Creates a workbench over the given collaborator.
    pub fn new(source: Arc<dyn DataSource>, config: EngineConfig) -> Self {
        Self {
            store: SessionStore::new(source.clone(), config),
            source,
            draft: RwLock::new(None),
        }
    }

    // ========================================================================
    // Browsing
    // ========================================================================

    /// Lists the collections of the connected store.
    pub async fn collections(&self) -> Result<Vec<String>> {
        self.source.list_collections().await
    }

    /// Opens (or focuses) the session for a collection.
    pub async fn open_session(&self, collection_id: &str) -> Result<BrowseSession> {
        self.store.open_session(collection_id).await
    }

    /// Closes a session, discarding its state.
    pub async fn close_session(&self, collection_id: &str) {
        self.store.close_session(collection_id).await;
    }

    /// Snapshot of the active session, if any.
    pub async fn active_session(&self) -> Option<BrowseSession> {
        self.store.active_session().await
    }

    /// Snapshot of one open session.
    pub async fn session(&self, collection_id: &str) -> Option<BrowseSession> {
        self.store.session(collection_id).await
    }

    /// Open collection ids in tab order.
    pub async fn open_collections(&self) -> Vec<String> {
        self.store.open_collections().await
    }

    /// Activates, changes or clears a session's search.
    pub async fn set_search(
        &self,
        collection_id: &str,
        search: Option<SearchSpec>,
    ) -> Result<BrowseSession> {
        self.store.set_search(collection_id, search).await
    }

    /// Navigates one page forward or backward.
    pub async fn paginate(
        &self,
        collection_id: &str,
        direction: PageDirection,
    ) -> Result<BrowseSession> {
        self.store.paginate(collection_id, direction).await
    }

    /// Re-runs the current query shape from page 1.
    pub async fn refresh(&self, collection_id: &str) -> Result<BrowseSession> {
        self.store.refresh(collection_id).await
    }

    /// Switches a session's display mode.
    pub async fn set_view_mode(&self, collection_id: &str, view_mode: ViewMode) -> Result<()> {
        self.store.set_view_mode(collection_id, view_mode).await
    }

    // ========================================================================
    // Draft editing
    // ========================================================================

    /// Opens the edit dialog for the active collection.
    ///
    /// With a document, the draft edits it in place; without one, the draft
    /// creates a new document from the placeholder body.
    pub async fn begin_edit(&self, document: Option<&Document>) -> Result<DraftEditor> {
        let session = self
            .store
            .active_session()
            .await
            .ok_or_else(|| VellumError::internal("no collection is active"))?;
        let editor = match document {
            Some(document) => DraftEditor::for_document(document),
            None => DraftEditor::for_new(),
        };
        let mut draft = self.draft.write().await;
        *draft = Some(ActiveDraft {
            collection_id: session.collection_id,
            editor: editor.clone(),
        });
        Ok(editor)
    }

    /// Snapshot of the open draft, if any.
    pub async fn draft(&self) -> Option<DraftEditor> {
        let draft = self.draft.read().await;
        draft.as_ref().map(|active| active.editor.clone())
    }

    /// Applies a row edit and returns the synchronized draft.
    pub async fn edit_rows_changed(&self, rows: Vec<FieldRow>) -> Result<DraftEditor> {
        let mut draft = self.draft.write().await;
        let active = draft
            .as_mut()
            .ok_or_else(|| VellumError::internal("no draft is open"))?;
        active.editor.rows_changed(rows);
        Ok(active.editor.clone())
    }

    /// Applies a text edit and returns the synchronized draft.
    ///
    /// A malformed blob surfaces a validation error; the rows stay as they
    /// were and the draft remains open.
    pub async fn edit_text_changed(&self, text: &str) -> Result<DraftEditor> {
        let mut draft = self.draft.write().await;
        let active = draft
            .as_mut()
            .ok_or_else(|| VellumError::internal("no draft is open"))?;
        active.editor.text_changed(text)?;
        Ok(active.editor.clone())
    }

    /// Sets the desired id of a new document. Ignored for existing ones.
    pub async fn edit_id_changed(&self, id: Option<String>) -> Result<()> {
        let mut draft = self.draft.write().await;
        let active = draft
            .as_mut()
            .ok_or_else(|| VellumError::internal("no draft is open"))?;
        active.editor.set_id(id);
        Ok(())
    }

    /// Discards the open draft without side effects.
    pub async fn cancel_edit(&self) {
        let mut draft = self.draft.write().await;
        *draft = None;
    }

    /// Validates and saves the open draft, then reloads its collection.
    ///
    /// The text blob is the single source of truth: if it does not parse as
    /// a JSON object the save is rejected with a validation error and no
    /// mutation is attempted. On a backend failure the draft stays open so
    /// the user can retry. Returns the id the document was written under.
    pub async fn commit_edit(&self) -> Result<String> {
        let mut draft = self.draft.write().await;
        let active = draft
            .as_mut()
            .ok_or_else(|| VellumError::internal("no draft is open"))?;
        let body = active.editor.commit_body()?;
        let id = match active.editor.target() {
            DraftTarget::Existing { id } => {
                self.source
                    .set_document(&active.collection_id, Some(id.as_str()), body)
                    .await?
            }
            DraftTarget::New { id } => {
                self.source
                    .set_document(&active.collection_id, id.as_deref(), body)
                    .await?
            }
        };
        let collection_id = active.collection_id.clone();
        *draft = None;
        drop(draft);

        // The save already happened; a reload failure (or the tab having
        // been closed meanwhile) must not turn it into an error.
        if let Err(err) = self.store.refresh(&collection_id).await {
            tracing::warn!(
                "[Workbench] reload of '{}' after save failed: {}",
                collection_id,
                err
            );
        }
        Ok(id)
    }

    /// Deletes the document the open draft is editing, then reloads its
    /// collection.
    pub async fn delete_current_document(&self) -> Result<()> {
        let mut draft = self.draft.write().await;
        let active = draft
            .as_ref()
            .ok_or_else(|| VellumError::internal("no draft is open"))?;
        let DraftTarget::Existing { id } = active.editor.target() else {
            return Err(VellumError::internal("draft has no saved document"));
        };
        self.source
            .delete_document(&active.collection_id, id)
            .await?;
        let collection_id = active.collection_id.clone();
        *draft = None;
        drop(draft);

        if let Err(err) = self.store.refresh(&collection_id).await {
            tracing::warn!(
                "[Workbench] reload of '{}' after delete failed: {}",
                collection_id,
                err
            );
        }
        Ok(())
    }
}
