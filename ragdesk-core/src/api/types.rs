//! Wire types for the chat backend's JSON API.

use crate::rag::{Document, RetrievalItem};
use serde::{Deserialize, Serialize};

/// Response of `GET /api/models`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelList {
    #[serde(default)]
    pub models: Vec<String>,
}

/// A single message in a chat request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Generation options forwarded to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    pub temperature: f64,
}

/// Request body of `POST /api/chat`.
///
/// The retrieval fields are only serialized when retrieval is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub options: ChatOptions,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_rag: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub rag_top_k: Option<usize>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            options: ChatOptions { temperature: 0.7 },
            use_rag: None,
            rag_top_k: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.options.temperature = temperature;
        self
    }

    /// Asks the server to ground the answer in the `top_k` best knowledge base passages.
    pub fn with_retrieval(mut self, top_k: usize) -> Self {
        self.use_rag = Some(true);
        self.rag_top_k = Some(top_k);
        self
    }
}

/// Response body of `POST /api/chat`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub message: Option<ResponseMessage>,

    #[serde(default)]
    pub rag_context: Option<Vec<RetrievalItem>>,

    #[serde(default)]
    pub rag_used: Option<bool>,
}

impl ChatResponse {
    /// Assistant text, if the payload carried any.
    pub fn content(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.content.as_deref())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// Response of `GET /api/rag/docs`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<Document>,
    #[serde(default)]
    pub stats: KnowledgeStats,
    #[serde(default)]
    pub embedding_model: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeStats {
    #[serde(default)]
    pub document_count: usize,
    #[serde(default)]
    pub chunk_count: usize,
}

/// Response of the add endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedDocument {
    pub document: Document,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AddTextRequest<'a> {
    pub text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct AddUrlRequest<'a> {
    pub url: &'a str,
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

/// Request body of `POST /api/tts`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    pub rate: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

/// Response of `POST /api/transcribe`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcription {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
}

/// Error body returned with non-2xx statuses.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// The detail message, if the server sent a usable one.
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::String(_) | serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_chat_request_without_retrieval_omits_fields() {
        let req = ChatRequest::new("llama3.2:1b", vec![Message::user("hej")]).with_temperature(0.2);
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["model"], "llama3.2:1b");
        assert_eq!(value["options"]["temperature"], 0.2);
        assert!(value.get("use_rag").is_none());
        assert!(value.get("rag_top_k").is_none());
    }

    #[test]
    fn test_chat_request_with_retrieval() {
        let req = ChatRequest::new("m", vec![Message::user("q")]).with_retrieval(4);
        let value = serde_json::to_value(&req).unwrap();

        assert_eq!(value["use_rag"], true);
        assert_eq!(value["rag_top_k"], 4);
    }

    #[test]
    fn test_chat_response_content() {
        let resp: ChatResponse = serde_json::from_value(json!({
            "model": "m",
            "message": {"role": "assistant", "content": "Hej!"},
            "rag_context": [{"doc_id": "a", "chunk_index": 0, "score": 0.5, "text": "t"}],
            "rag_used": true
        }))
        .unwrap();

        assert_eq!(resp.content(), Some("Hej!"));
        assert_eq!(resp.rag_context.unwrap().len(), 1);

        let empty: ChatResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(empty.content(), None);
        assert!(empty.rag_context.is_none());
    }

    #[test]
    fn test_error_body_message() {
        let body: ErrorBody = serde_json::from_value(json!({"detail": "Dokumentet hittades inte."})).unwrap();
        assert_eq!(body.message().as_deref(), Some("Dokumentet hittades inte."));

        let blank: ErrorBody = serde_json::from_value(json!({"detail": "  "})).unwrap();
        assert_eq!(blank.message(), None);

        let missing: ErrorBody = serde_json::from_value(json!({})).unwrap();
        assert_eq!(missing.message(), None);
    }
}
