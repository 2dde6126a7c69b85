//! The client session.
//!
//! Owns one instance of every component for the lifetime of the client.
//! Components share the backend and the preferences but own their own state:
//! only the [`DocumentRegistry`] writes the document list and the retrieval
//! toggle.

use crate::api::{Backend, HttpBackend, Transcription, Upload};
use crate::chat::ChatManager;
use crate::config::Config;
use crate::error::ClientError;
use crate::models::ModelSelector;
use crate::preferences::{FileStore, KeyValueStore, Preferences};
use crate::rag::{DocumentRegistry, RetrievalDisplay, TopKControl};
use crate::speech::SpeechOutput;
use std::sync::Arc;
use tracing::info;

pub struct Session {
    config: Config,
    backend: Arc<dyn Backend>,
    prefs: Preferences,
    models: Arc<ModelSelector>,
    registry: Arc<DocumentRegistry>,
    top_k: Arc<TopKControl>,
    display: Arc<RetrievalDisplay>,
    chat: ChatManager,
}

impl Session {
    /// Builds a session over any backend and preference store.
    ///
    /// When `config.speech.enabled` is set, a [`SpeechOutput`] listener is registered.
    pub fn new(config: Config, backend: Arc<dyn Backend>, store: Arc<dyn KeyValueStore>) -> Self {
        let prefs = Preferences::new(store);

        let models = Arc::new(ModelSelector::new(
            backend.clone(),
            prefs.clone(),
            config.chat.default_model.clone(),
        ));
        let registry = Arc::new(DocumentRegistry::new(
            backend.clone(),
            prefs.clone(),
            config.rag.max_imported_chars,
        ));
        let top_k = Arc::new(TopKControl::new(prefs.clone(), config.rag.default_top_k));
        let display = Arc::new(RetrievalDisplay::new());

        let chat = ChatManager::new(
            backend.clone(),
            &config.chat,
            models.clone(),
            registry.clone(),
            top_k.clone(),
            display.clone(),
        );

        if config.speech.enabled {
            chat.add_listener(Arc::new(SpeechOutput::new(
                backend.clone(),
                config.speech.clone(),
            )));
        }

        Self {
            config,
            backend,
            prefs,
            models,
            registry,
            top_k,
            display,
            chat,
        }
    }

    /// Session over HTTP with preferences stored in `config.storage.preferences_path`.
    pub fn connect(config: Config) -> Self {
        let backend = Arc::new(HttpBackend::new(&config.server.base_url));
        let store = Arc::new(FileStore::new(&config.storage.preferences_path));
        Self::new(config, backend, store)
    }

    /// Loads the model menu and the document list concurrently.
    pub async fn init(&self) {
        let (menu, snapshot) = tokio::join!(
            self.models.load_models(),
            self.registry.list_documents(None)
        );
        info!(
            model = %menu.selected,
            documents = snapshot.len(),
            "Session initialised"
        );
    }

    /// Uploads recorded audio and returns the transcript.
    pub async fn transcribe(&self, audio: Upload) -> Result<Transcription, ClientError> {
        Ok(self.backend.transcribe(audio).await?)
    }

    /// A speech output over this session's backend, whether or not it is registered.
    pub fn speech(&self) -> SpeechOutput {
        SpeechOutput::new(self.backend.clone(), self.config.speech.clone())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn models(&self) -> &ModelSelector {
        &self.models
    }

    pub fn registry(&self) -> &DocumentRegistry {
        &self.registry
    }

    pub fn top_k(&self) -> &TopKControl {
        &self.top_k
    }

    pub fn retrieval(&self) -> &RetrievalDisplay {
        &self.display
    }

    pub fn chat(&self) -> &ChatManager {
        &self.chat
    }
}
