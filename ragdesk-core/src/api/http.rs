//! HTTP implementation of the backend seam.

use super::types::*;
use super::{ApiError, Backend, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the chat backend.
///
/// No timeouts or retries are configured; transport failures surface to the
/// caller unchanged.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    /// The base URL of the server (e.g., "http://localhost:8000")
    base_url: String,
    http_client: reqwest::Client,
}

impl HttpBackend {
    /// Creates a new client for the server at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Builds `/api/rag/docs/{id}` with the id encoded as a single path segment.
    ///
    /// Ids that would not survive as their own segment (blank, `.`, `..`) are
    /// refused: they would otherwise resolve to the collection itself.
    fn document_url(&self, id: &str) -> Result<Url> {
        if matches!(id.trim(), "" | "." | "..") {
            return Err(ApiError::InvalidUrl(format!("invalid document id {id:?}")));
        }

        let collection = Url::parse(&self.endpoint("/api/rag/docs"))
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let mut url = collection.clone();
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidUrl(self.base_url.clone()))?
            .push(id);

        let depth = |u: &Url| u.path_segments().map(|s| s.count()).unwrap_or(0);
        if depth(&url) != depth(&collection) + 1 {
            return Err(ApiError::InvalidUrl(format!("invalid document id {id:?}")));
        }
        Ok(url)
    }

    async fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let response = check(response).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn post_created(&self, request: reqwest::RequestBuilder) -> Result<CreatedDocument> {
        let response = request.send().await?;
        Self::json(response).await
    }
}

/// Turns a non-2xx response into [`ApiError::Status`], keeping the server's detail.
async fn check(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.message());

    debug!(status = status.as_u16(), ?detail, "Backend returned an error status");
    Err(ApiError::Status {
        status: status.as_u16(),
        detail,
    })
}

fn file_part(upload: Upload, mime: &str) -> Result<Part> {
    Ok(Part::bytes(upload.bytes)
        .file_name(upload.filename)
        .mime_str(mime)?)
}

#[async_trait]
impl Backend for HttpBackend {
    async fn list_models(&self) -> Result<ModelList> {
        let response = self
            .http_client
            .get(self.endpoint("/api/models"))
            .send()
            .await?;
        Self::json(response).await
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let response = self
            .http_client
            .post(self.endpoint("/api/chat"))
            .json(&request)
            .send()
            .await?;
        Self::json(response).await
    }

    async fn list_documents(&self) -> Result<DocumentList> {
        let response = self
            .http_client
            .get(self.endpoint("/api/rag/docs"))
            .send()
            .await?;
        Self::json(response).await
    }

    async fn add_text(&self, text: &str) -> Result<CreatedDocument> {
        let request = self
            .http_client
            .post(self.endpoint("/api/rag/docs"))
            .json(&AddTextRequest { text });
        self.post_created(request).await
    }

    async fn add_url(&self, url: &str) -> Result<CreatedDocument> {
        let request = self
            .http_client
            .post(self.endpoint("/api/rag/docs/url"))
            .json(&AddUrlRequest { url });
        self.post_created(request).await
    }

    async fn add_pdf(&self, file: Upload) -> Result<CreatedDocument> {
        let form = Form::new().part("file", file_part(file, "application/pdf")?);
        let request = self
            .http_client
            .post(self.endpoint("/api/rag/docs/pdf"))
            .multipart(form);
        self.post_created(request).await
    }

    async fn delete_document(&self, id: &str) -> Result<()> {
        let response = self
            .http_client
            .delete(self.document_url(id)?)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn clear_documents(&self) -> Result<()> {
        let response = self
            .http_client
            .delete(self.endpoint("/api/rag/docs"))
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn synthesize(&self, request: SpeechRequest) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .post(self.endpoint("/api/tts"))
            .json(&request)
            .send()
            .await?;
        let response = check(response).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn transcribe(&self, audio: Upload) -> Result<Transcription> {
        let form = Form::new().part("audio", file_part(audio, "application/octet-stream")?);
        let response = self
            .http_client
            .post(self.endpoint("/api/transcribe"))
            .multipart(form)
            .send()
            .await?;
        Self::json(response).await
    }
}
