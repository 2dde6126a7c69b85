use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// A document held in the server's knowledge base.
///
/// The client only caches what the server lists. `chunks` is the number of
/// retrieval fragments the server split the document into and is displayed
/// as-is, never recomputed.
///
/// # Example
///
/// ```
/// use ragdesk_core::rag::{Document, DocumentSource};
///
/// let doc: Document = serde_json::from_str(r#"{
///     "id": "4f1c",
///     "preview": "Raspberry Pi 5 har fyra kärnor…",
///     "chunks": 3,
///     "created_at": "2024-05-01T08:30:00.123456",
///     "metadata": {"type": "url", "url": "https://example.com", "title": "Example"}
/// }"#).unwrap();
///
/// assert_eq!(doc.source_label(), "Example");
/// assert!(matches!(doc.metadata.source, DocumentSource::Url { .. }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub preview: String,
    #[serde(default)]
    pub chunks: usize,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Human-readable origin: the page title or URL, the PDF filename, or "Manual text".
    pub fn source_label(&self) -> String {
        match &self.metadata.source {
            DocumentSource::ManualText => "Manual text".to_string(),
            DocumentSource::Url { url, title } => title
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .unwrap_or(url)
                .to_string(),
            DocumentSource::Pdf { filename, .. } => filename.clone(),
        }
    }

    /// Creation time as `YYYY-MM-DD HH:MM`, or `None` when missing or unparsable.
    pub fn created_at_display(&self) -> Option<String> {
        let raw = self.created_at.as_deref()?.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.format("%Y-%m-%d %H:%M").to_string());
        }
        raw.parse::<NaiveDateTime>()
            .ok()
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
    }

    /// Extra provenance notes for display (page usage, original size, truncation).
    pub fn notes(&self, max_imported_chars: usize) -> Vec<String> {
        let mut notes = Vec::new();

        if let DocumentSource::Pdf {
            pages_used,
            total_pages,
            ..
        } = &self.metadata.source
        {
            match (pages_used, total_pages) {
                (Some(used), Some(total)) => notes.push(format!("{used} of {total} pages")),
                (None, Some(total)) => notes.push(format!("{total} pages")),
                (Some(used), None) => notes.push(format!("{used} pages")),
                (None, None) => {}
            }
        }

        if let Some(chars) = self.metadata.original_characters {
            notes.push(format!("{chars} characters"));
        }

        if self.metadata.truncated {
            notes.push(format!("truncated to {max_imported_chars} characters"));
        }

        notes
    }
}

/// Where a document came from.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DocumentSource {
    #[default]
    ManualText,
    Url {
        url: String,
        title: Option<String>,
    },
    Pdf {
        filename: String,
        pages_used: Option<u32>,
        total_pages: Option<u32>,
    },
}

/// Provenance metadata attached to a document by the server.
///
/// Legacy entries may carry an empty object; a missing or unknown `type`
/// is treated as manual text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "RawMetadata", into = "RawMetadata")]
pub struct DocumentMetadata {
    pub source: DocumentSource,
    /// Length of the text before the server split it
    pub original_characters: Option<u64>,
    /// The content exceeded the server's character ceiling and was cut
    pub truncated: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawMetadata {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pages_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_pages: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_characters: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    truncated: bool,
}

impl From<RawMetadata> for DocumentMetadata {
    fn from(raw: RawMetadata) -> Self {
        let source = match raw.kind.as_deref() {
            Some("url") => DocumentSource::Url {
                url: raw.url.unwrap_or_default(),
                title: raw.title,
            },
            Some("pdf") => DocumentSource::Pdf {
                filename: raw.filename.unwrap_or_else(|| "document.pdf".to_string()),
                pages_used: raw.pages_used,
                total_pages: raw.total_pages,
            },
            _ => DocumentSource::ManualText,
        };

        Self {
            source,
            original_characters: raw.original_characters,
            truncated: raw.truncated,
        }
    }
}

impl From<DocumentMetadata> for RawMetadata {
    fn from(meta: DocumentMetadata) -> Self {
        let mut raw = RawMetadata {
            original_characters: meta.original_characters,
            truncated: meta.truncated,
            ..Default::default()
        };
        match meta.source {
            DocumentSource::ManualText => raw.kind = Some("text".to_string()),
            DocumentSource::Url { url, title } => {
                raw.kind = Some("url".to_string());
                raw.url = Some(url);
                raw.title = title;
            }
            DocumentSource::Pdf {
                filename,
                pages_used,
                total_pages,
            } => {
                raw.kind = Some("pdf".to_string());
                raw.filename = Some(filename);
                raw.pages_used = pages_used;
                raw.total_pages = total_pages;
            }
        }
        raw
    }
}

/// The client's cached view of the knowledge base listing.
///
/// Document order is the server's. `chunk_count` is the server's aggregate and is
/// never re-derived by summing documents.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub documents: Vec<Document>,
    pub chunk_count: usize,
    pub embedding_model: Option<String>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }
}

/// A passage the server retrieved to ground an answer.
///
/// Order is authoritative from the server (best match first).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RetrievalItem {
    #[serde(default)]
    pub text: Option<String>,
    /// Similarity, nominally in [-1, 1]
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

impl RetrievalItem {
    pub fn new(text: impl Into<String>, score: f64) -> Self {
        Self {
            text: Some(text.into()),
            score: Some(score),
            doc_id: None,
            chunk_index: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc_with_metadata(json: &str) -> Document {
        let metadata: DocumentMetadata = serde_json::from_str(json).unwrap();
        Document {
            id: "d1".to_string(),
            preview: String::new(),
            chunks: 1,
            created_at: None,
            metadata,
        }
    }

    #[test]
    fn test_empty_metadata_is_manual_text() {
        let doc = doc_with_metadata("{}");
        assert_eq!(doc.metadata.source, DocumentSource::ManualText);
        assert_eq!(doc.source_label(), "Manual text");
        assert!(doc.notes(40_000).is_empty());
    }

    #[test]
    fn test_unknown_kind_is_manual_text() {
        let doc = doc_with_metadata(r#"{"type": "audio"}"#);
        assert_eq!(doc.metadata.source, DocumentSource::ManualText);
    }

    #[test]
    fn test_url_without_title_uses_url() {
        let doc = doc_with_metadata(r#"{"type": "url", "url": "https://example.com/a"}"#);
        assert_eq!(doc.source_label(), "https://example.com/a");
    }

    #[test]
    fn test_pdf_notes() {
        let doc = doc_with_metadata(
            r#"{"type": "pdf", "filename": "manual.pdf", "pages_used": 40, "total_pages": 120,
                "original_characters": 52000, "truncated": true}"#,
        );
        assert_eq!(doc.source_label(), "manual.pdf");
        assert_eq!(
            doc.notes(40_000),
            vec![
                "40 of 120 pages".to_string(),
                "52000 characters".to_string(),
                "truncated to 40000 characters".to_string(),
            ]
        );
    }

    #[test]
    fn test_created_at_formats() {
        let mut doc = doc_with_metadata("{}");

        doc.created_at = Some("2024-05-01T08:30:00.123456".to_string());
        assert_eq!(doc.created_at_display().as_deref(), Some("2024-05-01 08:30"));

        doc.created_at = Some("2024-05-01T08:30:00+02:00".to_string());
        assert_eq!(doc.created_at_display().as_deref(), Some("2024-05-01 08:30"));

        doc.created_at = Some("yesterday".to_string());
        assert_eq!(doc.created_at_display(), None);

        doc.created_at = None;
        assert_eq!(doc.created_at_display(), None);
    }

    #[test]
    fn test_document_tolerates_missing_fields() {
        let doc: Document = serde_json::from_str(r#"{"id": "x"}"#).unwrap();
        assert_eq!(doc.chunks, 0);
        assert_eq!(doc.preview, "");
        assert_eq!(doc.metadata, DocumentMetadata::default());
    }

    #[test]
    fn test_retrieval_item_tolerates_null_score() {
        let item: RetrievalItem = serde_json::from_str(r#"{"text": "a", "score": null}"#).unwrap();
        assert_eq!(item.score, None);
        assert_eq!(item.text.as_deref(), Some("a"));
    }
}
