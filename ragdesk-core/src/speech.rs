//! Spoken replies through the backend's text-to-speech endpoint.

use crate::api::{Backend, SpeechRequest};
use crate::chat::{AssistantListener, ChatMessage};
use crate::config::SpeechConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Synthesizes assistant replies to a WAV file.
///
/// Registered as an [`AssistantListener`] it works in the background: each
/// reply is synthesized on a detached task and failures are only logged.
#[derive(Clone)]
pub struct SpeechOutput {
    backend: Arc<dyn Backend>,
    config: SpeechConfig,
}

impl SpeechOutput {
    pub fn new(backend: Arc<dyn Backend>, config: SpeechConfig) -> Self {
        Self { backend, config }
    }

    pub fn output_path(&self) -> &Path {
        Path::new(&self.config.output_path)
    }

    /// Synthesizes `text` and writes the audio to the configured path.
    pub async fn speak(&self, text: &str) -> Result<PathBuf> {
        let request = SpeechRequest {
            text: text.to_string(),
            rate: self.config.rate,
            voice: self.config.voice.clone(),
        };

        let audio = self
            .backend
            .synthesize(request)
            .await
            .context("Speech synthesis failed")?;

        let path = self.output_path().to_path_buf();
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        tokio::fs::write(&path, &audio)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(bytes = audio.len(), path = %path.display(), "Reply synthesized");
        Ok(path)
    }
}

impl AssistantListener for SpeechOutput {
    fn on_assistant_message(&self, message: &ChatMessage) -> Result<()> {
        let text = message.text.trim();
        if text.is_empty() {
            return Ok(());
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!("No async runtime, skipping speech output");
            return Ok(());
        };

        let speech = self.clone();
        let text = text.to_string();
        handle.spawn(async move {
            if let Err(e) = speech.speak(&text).await {
                warn!(error = %e, "Speech output failed");
            }
        });
        Ok(())
    }
}
