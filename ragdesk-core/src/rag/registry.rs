//! Knowledge base document registry.
//!
//! The registry owns the rendered document list, the aggregate stats and the
//! retrieval toggle. Every mutation goes to the server first; on success the
//! whole listing is fetched again and re-rendered, so the client never
//! speculates about server state.
//!
//! # Toggle reconciliation
//!
//! The retrieval toggle is a pure function of the document count, re-evaluated
//! after every successful listing:
//!
//! - no documents: disabled and unchecked, and the off state is persisted
//! - otherwise: enabled, restoring the stored preference (never forced on)

use super::types::{Document, DocumentSource, Snapshot};
use crate::api::{self, Backend, CreatedDocument, Upload};
use crate::error::ClientError;
use crate::lock;
use crate::preferences::Preferences;
use crate::status::Status;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// State of the retrieval-enable toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RagToggle {
    pub disabled: bool,
    pub checked: bool,
}

impl RagToggle {
    const OFF: RagToggle = RagToggle {
        disabled: true,
        checked: false,
    };

    /// Whether a chat request should ask for retrieval.
    pub fn is_active(&self) -> bool {
        !self.disabled && self.checked
    }
}

/// A rendered row of the document list.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentRow {
    pub id: String,
    pub label: String,
    pub preview: String,
    pub chunks: usize,
    pub created_at: Option<String>,
    pub notes: Vec<String>,
}

/// Everything the knowledge base panel shows.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryView {
    pub rows: Vec<DocumentRow>,
    pub chunk_count: usize,
    pub embedding_model: Option<String>,
    pub toggle: RagToggle,
    pub status: Option<Status>,
}

#[derive(Debug)]
struct RegistryState {
    snapshot: Snapshot,
    toggle: RagToggle,
    status: Option<Status>,
}

/// Client for the server's knowledge base.
///
/// Operations take `&self` and may overlap; each applies its result when its
/// response arrives, so the last one to finish wins.
pub struct DocumentRegistry {
    backend: Arc<dyn Backend>,
    prefs: Preferences,
    max_imported_chars: usize,
    state: RwLock<RegistryState>,
}

impl DocumentRegistry {
    /// Creates an empty registry. The toggle stays disabled until the first listing.
    pub fn new(backend: Arc<dyn Backend>, prefs: Preferences, max_imported_chars: usize) -> Self {
        Self {
            backend,
            prefs,
            max_imported_chars,
            state: RwLock::new(RegistryState {
                snapshot: Snapshot::default(),
                toggle: RagToggle::OFF,
                status: None,
            }),
        }
    }

    /// Fetches and renders the document list.
    ///
    /// `status` replaces the derived summary line when given. On failure the
    /// rendered list is cleared, the toggle is disabled and an error status
    /// names the reason; an empty snapshot is returned.
    ///
    /// A failed listing does not persist the off state: the stored preference
    /// is only overwritten when the server confirms an empty knowledge base,
    /// and is restored by the next successful listing.
    pub async fn list_documents(&self, status: Option<Status>) -> Snapshot {
        match self.backend.list_documents().await {
            Ok(list) => {
                let snapshot = Snapshot {
                    documents: list.documents,
                    chunk_count: list.stats.chunk_count,
                    embedding_model: list.embedding_model,
                };
                let toggle = self.reconcile(snapshot.len());
                let status = status.unwrap_or_else(|| summary(&snapshot));

                info!(
                    documents = snapshot.len(),
                    chunks = snapshot.chunk_count,
                    "Knowledge base listed"
                );

                let mut state = lock::write(&self.state);
                state.snapshot = snapshot.clone();
                state.toggle = toggle;
                state.status = Some(status);
                snapshot
            }
            Err(e) => {
                let err = ClientError::from(e);
                warn!(error = %err, "Failed to list knowledge base documents");

                let mut state = lock::write(&self.state);
                state.snapshot = Snapshot::default();
                state.toggle = RagToggle::OFF;
                state.status = Some(Status::error(format!("Could not load documents: {err}")));
                Snapshot::default()
            }
        }
    }

    /// Adds free text. Blank input is rejected without a network call.
    pub async fn add_text(&self, text: &str) -> Status {
        if text.trim().is_empty() {
            return self.reject("Enter some text to add.");
        }
        let result = self.backend.add_text(text).await;
        self.finish_add(result).await
    }

    /// Imports a web page. A blank URL is rejected without a network call.
    pub async fn add_url(&self, url: &str) -> Status {
        let url = url.trim();
        if url.is_empty() {
            return self.reject("Enter a URL to import.");
        }
        let result = self.backend.add_url(url).await;
        self.finish_add(result).await
    }

    /// Uploads a PDF. Rejected without a network call when no file is chosen.
    pub async fn add_pdf(&self, file: Option<Upload>) -> Status {
        let Some(file) = file else {
            return self.reject("Choose a PDF file to upload.");
        };
        let result = self.backend.add_pdf(file).await;
        self.finish_add(result).await
    }

    /// Deletes one document. Does nothing for a missing or empty id.
    ///
    /// A failed delete reports an error but leaves the rendered list and stats
    /// as they were until the next listing.
    pub async fn delete_document(&self, id: Option<&str>) -> Option<Status> {
        let id = id.filter(|id| !id.is_empty())?;

        match self.backend.delete_document(id).await {
            Ok(()) => {
                info!(id, "Document deleted");
                self.list_documents(Some(Status::success("Document removed.")))
                    .await;
                Some(self.current_status())
            }
            Err(e) => Some(self.fail(e)),
        }
    }

    /// Removes every document after `confirm` approves.
    ///
    /// A declined confirmation performs no network call and changes nothing.
    pub async fn clear_all<F>(&self, confirm: F) -> Option<Status>
    where
        F: FnOnce() -> bool,
    {
        if !confirm() {
            return None;
        }

        match self.backend.clear_documents().await {
            Ok(()) => {
                info!("Knowledge base cleared");
                self.list_documents(Some(Status::success("Knowledge base cleared.")))
                    .await;
                Some(self.current_status())
            }
            Err(e) => Some(self.fail(e)),
        }
    }

    /// User flipped the retrieval toggle.
    ///
    /// Ignored while the toggle is disabled; otherwise applied and persisted.
    /// Returns whether the change was applied.
    pub fn set_rag_enabled(&self, enabled: bool) -> bool {
        let mut state = lock::write(&self.state);
        if state.toggle.disabled {
            return false;
        }
        state.toggle.checked = enabled;
        drop(state);

        self.prefs.set_rag_enabled(enabled);
        true
    }

    pub fn toggle(&self) -> RagToggle {
        lock::read(&self.state).toggle
    }

    pub fn snapshot(&self) -> Snapshot {
        lock::read(&self.state).snapshot.clone()
    }

    pub fn status(&self) -> Option<Status> {
        lock::read(&self.state).status.clone()
    }

    /// The fully rendered panel.
    pub fn view(&self) -> RegistryView {
        let state = lock::read(&self.state);
        RegistryView {
            rows: state
                .snapshot
                .documents
                .iter()
                .map(|doc| DocumentRow {
                    id: doc.id.clone(),
                    label: doc.source_label(),
                    preview: doc.preview.clone(),
                    chunks: doc.chunks,
                    created_at: doc.created_at_display(),
                    notes: doc.notes(self.max_imported_chars),
                })
                .collect(),
            chunk_count: state.snapshot.chunk_count,
            embedding_model: state.snapshot.embedding_model.clone(),
            toggle: state.toggle,
            status: state.status.clone(),
        }
    }

    fn reconcile(&self, document_count: usize) -> RagToggle {
        if document_count == 0 {
            self.prefs.set_rag_enabled(false);
            RagToggle::OFF
        } else {
            RagToggle {
                disabled: false,
                checked: self.prefs.rag_enabled(),
            }
        }
    }

    async fn finish_add(&self, result: api::Result<CreatedDocument>) -> Status {
        match result {
            Ok(created) => {
                info!(id = %created.document.id, chunks = created.document.chunks, "Document added");
                let message = describe_created(&created.document, self.max_imported_chars);
                self.list_documents(Some(Status::success(message))).await;
                self.current_status()
            }
            Err(e) => self.fail(e),
        }
    }

    fn reject(&self, message: &str) -> Status {
        self.set_status(Status::from(&ClientError::Validation(message.to_string())))
    }

    fn fail(&self, err: api::ApiError) -> Status {
        let err = ClientError::from(err);
        warn!(error = %err, "Knowledge base operation failed");
        self.set_status(Status::from(&err))
    }

    fn set_status(&self, status: Status) -> Status {
        lock::write(&self.state).status = Some(status.clone());
        status
    }

    fn current_status(&self) -> Status {
        self.status().unwrap_or_else(|| summary(&Snapshot::default()))
    }
}

/// Summary line derived from a snapshot when no override is given.
fn summary(snapshot: &Snapshot) -> Status {
    if snapshot.is_empty() {
        Status::info("No documents yet.")
    } else {
        Status::info(format!(
            "{}, {}.",
            plural(snapshot.len(), "document"),
            plural(snapshot.chunk_count, "chunk")
        ))
    }
}

fn describe_created(doc: &Document, max_imported_chars: usize) -> String {
    let chunks = plural(doc.chunks, "chunk");
    let mut message = match &doc.metadata.source {
        DocumentSource::ManualText => format!("Text added ({chunks})."),
        DocumentSource::Url { .. } => format!("Imported {} ({chunks}).", doc.source_label()),
        DocumentSource::Pdf {
            filename,
            pages_used: Some(used),
            total_pages: Some(total),
        } => format!("Imported {filename}, {used} of {total} pages ({chunks})."),
        DocumentSource::Pdf { filename, .. } => format!("Imported {filename} ({chunks})."),
    };
    if doc.metadata.truncated {
        message.push_str(&format!(
            " Content was truncated to {max_imported_chars} characters."
        ));
    }
    message
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::DocumentMetadata;

    fn doc(source: DocumentSource, chunks: usize, truncated: bool) -> Document {
        Document {
            id: "d".to_string(),
            preview: String::new(),
            chunks,
            created_at: None,
            metadata: DocumentMetadata {
                source,
                original_characters: None,
                truncated,
            },
        }
    }

    #[test]
    fn test_summary() {
        assert_eq!(summary(&Snapshot::default()).text, "No documents yet.");

        let snapshot = Snapshot {
            documents: vec![doc(DocumentSource::ManualText, 3, false)],
            chunk_count: 3,
            embedding_model: None,
        };
        assert_eq!(summary(&snapshot).text, "1 document, 3 chunks.");
    }

    #[test]
    fn test_describe_created() {
        assert_eq!(
            describe_created(&doc(DocumentSource::ManualText, 1, false), 40_000),
            "Text added (1 chunk)."
        );

        let url = DocumentSource::Url {
            url: "https://example.com".to_string(),
            title: Some("Example".to_string()),
        };
        assert_eq!(
            describe_created(&doc(url, 4, true), 40_000),
            "Imported Example (4 chunks). Content was truncated to 40000 characters."
        );

        let pdf = DocumentSource::Pdf {
            filename: "manual.pdf".to_string(),
            pages_used: Some(40),
            total_pages: Some(55),
        };
        assert_eq!(
            describe_created(&doc(pdf, 12, false), 40_000),
            "Imported manual.pdf, 40 of 55 pages (12 chunks)."
        );
    }

    #[test]
    fn test_toggle_is_active() {
        assert!(!RagToggle::OFF.is_active());
        assert!(RagToggle { disabled: false, checked: true }.is_active());
        assert!(!RagToggle { disabled: true, checked: true }.is_active());
    }
}
