//! In-memory backend shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use ragdesk_core::api::{
    self, ApiError, Backend, ChatRequest, ChatResponse, CreatedDocument, DocumentList,
    KnowledgeStats, ModelList, SpeechRequest, Transcription, Upload,
};
use ragdesk_core::rag::Document;
use ragdesk_core::{Config, MemoryStore, Session};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A failure the fake answers with: HTTP status plus optional `detail`.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status: u16,
    pub detail: Option<String>,
}

impl Failure {
    pub fn status(status: u16) -> Self {
        Self { status, detail: None }
    }

    pub fn detail(status: u16, detail: &str) -> Self {
        Self {
            status,
            detail: Some(detail.to_string()),
        }
    }

    fn to_error(&self) -> ApiError {
        ApiError::Status {
            status: self.status,
            detail: self.detail.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct FakeState {
    pub documents: Vec<Document>,
    pub next_id: usize,
    pub models: Vec<String>,
    pub models_failure: Option<Failure>,
    pub list_failure: Option<Failure>,
    pub add_failure: Option<Failure>,
    pub delete_failure: Option<Failure>,
    pub clear_failure: Option<Failure>,
    pub chat_failure: Option<Failure>,
    /// Each listing takes the next gate and holds its response until notified
    pub list_gates: VecDeque<Arc<Notify>>,
    /// Raw JSON answered by `/api/chat`
    pub chat_reply: Option<Value>,
    pub chat_requests: Vec<ChatRequest>,
    pub speech_requests: Vec<SpeechRequest>,
    /// Endpoint names in call order
    pub calls: Vec<&'static str>,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    pub state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.with(|s| s.calls.clone())
    }

    pub fn last_chat_request(&self) -> Option<ChatRequest> {
        self.with(|s| s.chat_requests.last().cloned())
    }

    fn record(&self, call: &'static str) {
        self.with(|s| s.calls.push(call));
    }

    fn create(&self, metadata: Value, text_len: usize) -> api::Result<CreatedDocument> {
        self.with(|s| {
            if let Some(failure) = &s.add_failure {
                return Err(failure.to_error());
            }
            s.next_id += 1;
            let document: Document = serde_json::from_value(json!({
                "id": format!("doc-{}", s.next_id),
                "preview": "preview",
                "chunks": 1 + text_len / 600,
                "created_at": "2024-05-01T08:30:00.123456",
                "metadata": metadata,
            }))
            .unwrap();
            s.documents.push(document.clone());
            Ok(CreatedDocument { document })
        })
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn list_models(&self) -> api::Result<ModelList> {
        self.record("list_models");
        self.with(|s| match &s.models_failure {
            Some(f) => Err(f.to_error()),
            None => Ok(ModelList {
                models: s.models.clone(),
            }),
        })
    }

    async fn chat(&self, request: ChatRequest) -> api::Result<ChatResponse> {
        self.record("chat");
        self.with(|s| {
            s.chat_requests.push(request);
            if let Some(f) = &s.chat_failure {
                return Err(f.to_error());
            }
            let reply = s.chat_reply.clone().unwrap_or_else(|| {
                json!({"message": {"role": "assistant", "content": "Hej!"}, "rag_context": [], "rag_used": false})
            });
            Ok(serde_json::from_value(reply).unwrap())
        })
    }

    async fn list_documents(&self) -> api::Result<DocumentList> {
        self.record("list_documents");
        let (result, gate) = self.with(|s| {
            let result = match &s.list_failure {
                Some(f) => Err(f.to_error()),
                None => Ok(DocumentList {
                    documents: s.documents.clone(),
                    stats: KnowledgeStats {
                        document_count: s.documents.len(),
                        chunk_count: s.documents.iter().map(|d| d.chunks).sum(),
                    },
                    embedding_model: Some("nomic-embed-text".to_string()),
                }),
            };
            (result, s.list_gates.pop_front())
        });
        if let Some(gate) = gate {
            gate.notified().await;
        }
        result
    }

    async fn add_text(&self, text: &str) -> api::Result<CreatedDocument> {
        self.record("add_text");
        self.create(json!({"type": "text", "original_characters": text.len()}), text.len())
    }

    async fn add_url(&self, url: &str) -> api::Result<CreatedDocument> {
        self.record("add_url");
        self.create(json!({"type": "url", "url": url, "title": "Example"}), 1200)
    }

    async fn add_pdf(&self, file: Upload) -> api::Result<CreatedDocument> {
        self.record("add_pdf");
        if !file.filename.to_lowercase().ends_with(".pdf") {
            return Err(Failure::detail(400, "Endast PDF-filer stöds.").to_error());
        }
        self.create(
            json!({"type": "pdf", "filename": file.filename, "pages_used": 2, "total_pages": 2}),
            file.bytes.len(),
        )
    }

    async fn delete_document(&self, id: &str) -> api::Result<()> {
        self.record("delete_document");
        self.with(|s| {
            if let Some(f) = &s.delete_failure {
                return Err(f.to_error());
            }
            let before = s.documents.len();
            s.documents.retain(|d| d.id != id);
            if s.documents.len() == before {
                return Err(Failure::detail(404, "Dokumentet hittades inte.").to_error());
            }
            Ok(())
        })
    }

    async fn clear_documents(&self) -> api::Result<()> {
        self.record("clear_documents");
        self.with(|s| {
            if let Some(f) = &s.clear_failure {
                return Err(f.to_error());
            }
            s.documents.clear();
            Ok(())
        })
    }

    async fn synthesize(&self, request: SpeechRequest) -> api::Result<Vec<u8>> {
        self.record("synthesize");
        self.with(|s| s.speech_requests.push(request));
        Ok(b"RIFF....WAVE".to_vec())
    }

    async fn transcribe(&self, _audio: Upload) -> api::Result<Transcription> {
        self.record("transcribe");
        Ok(Transcription {
            text: "Vad är klockan?".to_string(),
            language: Some("sv".to_string()),
            duration: Some(1.5),
        })
    }
}

/// A session over a fresh fake backend and in-memory preferences.
pub fn session() -> (Session, Arc<FakeBackend>, Arc<MemoryStore>) {
    session_with(Config::default())
}

pub fn session_with(config: Config) -> (Session, Arc<FakeBackend>, Arc<MemoryStore>) {
    let backend = FakeBackend::new();
    let store = Arc::new(MemoryStore::new());
    let session = Session::new(config, backend.clone(), store.clone());
    (session, backend, store)
}
