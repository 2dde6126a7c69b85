//! Backend seam.
//!
//! Every component talks to the chat server through the [`Backend`] trait.
//! [`HttpBackend`] is the real implementation; tests substitute an in-memory one.

mod http;
mod types;

pub use http::HttpBackend;
pub use types::{
    ChatOptions, ChatRequest, ChatResponse, CreatedDocument, DocumentList, KnowledgeStats,
    Message, ModelList, ResponseMessage, SpeechRequest, Transcription, Upload,
};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Non-2xx status, with the server's `detail` message when it sent one
    #[error("HTTP {status}")]
    Status { status: u16, detail: Option<String> },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

pub type Result<T> = std::result::Result<T, ApiError>;

/// Operations the chat backend exposes.
///
/// Implementations must not retry or time out on their own; every failure is
/// returned to the caller as-is.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /api/models`
    async fn list_models(&self) -> Result<ModelList>;

    /// `POST /api/chat`
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// `GET /api/rag/docs`
    async fn list_documents(&self) -> Result<DocumentList>;

    /// `POST /api/rag/docs`
    async fn add_text(&self, text: &str) -> Result<CreatedDocument>;

    /// `POST /api/rag/docs/url`
    async fn add_url(&self, url: &str) -> Result<CreatedDocument>;

    /// `POST /api/rag/docs/pdf` (multipart field `file`)
    async fn add_pdf(&self, file: Upload) -> Result<CreatedDocument>;

    /// `DELETE /api/rag/docs/{id}`
    async fn delete_document(&self, id: &str) -> Result<()>;

    /// `DELETE /api/rag/docs`
    async fn clear_documents(&self) -> Result<()>;

    /// `POST /api/tts`, returning WAV bytes.
    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>>;

    /// `POST /api/transcribe` (multipart field `audio`)
    async fn transcribe(&self, audio: Upload) -> Result<Transcription>;
}
