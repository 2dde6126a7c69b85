//! Conversation orchestration.
//!
//! The `ChatManager` turns a line of user input into one request to the chat
//! endpoint and routes the answer into the history and the retrieval display.
//!
//! # Send Flow
//!
//! ```text
//! input → append user message → resolve model / toggle / top-K
//!       → clear retrieval display → POST /api/chat
//!       → append assistant message → render or clear passages → notify listeners
//! ```
//!
//! Each request carries the fixed system instruction and the single user
//! message; earlier turns are kept for display only.

use super::listener::AssistantListener;
use super::types::ChatMessage;
use crate::api::{Backend, ChatRequest, Message};
use crate::config::ChatConfig;
use crate::error::ClientError;
use crate::lock;
use crate::models::ModelSelector;
use crate::rag::{DocumentRegistry, RetrievalDisplay, TopKControl};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Shown when the server answers without any content.
pub const EMPTY_REPLY: &str = "(no response)";

/// Appended to every error reply.
pub const TROUBLESHOOTING_HINT: &str =
    "Check that the backend is running and that the selected model is installed.";

/// Manages the chat session: history, request composition and reply routing.
///
/// # Examples
///
/// ```no_run
/// use ragdesk_core::{Config, Session};
///
/// # async fn example() -> anyhow::Result<()> {
/// let session = Session::connect(Config::load_or_default());
/// session.init().await;
///
/// if let Some(reply) = session.chat().send("Vad är en Raspberry Pi?").await {
///     println!("AI: {}", reply.text);
/// }
/// # Ok(())
/// # }
/// ```
pub struct ChatManager {
    backend: Arc<dyn Backend>,
    system_prompt: String,
    default_temperature: f64,
    models: Arc<ModelSelector>,
    registry: Arc<DocumentRegistry>,
    top_k: Arc<TopKControl>,
    display: Arc<RetrievalDisplay>,
    temperature: RwLock<f64>,
    history: RwLock<Vec<ChatMessage>>,
    listeners: RwLock<Vec<Arc<dyn AssistantListener>>>,
    in_flight: AtomicUsize,
}

impl ChatManager {
    pub fn new(
        backend: Arc<dyn Backend>,
        config: &ChatConfig,
        models: Arc<ModelSelector>,
        registry: Arc<DocumentRegistry>,
        top_k: Arc<TopKControl>,
        display: Arc<RetrievalDisplay>,
    ) -> Self {
        Self {
            backend,
            system_prompt: config.system_prompt.clone(),
            default_temperature: config.temperature,
            models,
            registry,
            top_k,
            display,
            temperature: RwLock::new(config.temperature),
            history: RwLock::new(Vec::new()),
            listeners: RwLock::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
        }
    }

    /// Registers a listener for assistant messages (e.g. speech output).
    pub fn add_listener(&self, listener: Arc<dyn AssistantListener>) {
        lock::write(&self.listeners).push(listener);
    }

    /// Sets the temperature control. Non-finite values reset it to the configured default.
    pub fn set_temperature(&self, temperature: f64) {
        let value = if temperature.is_finite() {
            temperature
        } else {
            self.default_temperature
        };
        *lock::write(&self.temperature) = value;
    }

    pub fn temperature(&self) -> f64 {
        *lock::read(&self.temperature)
    }

    /// Whether a chat request is awaiting its response.
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    /// The conversation so far, oldest first.
    pub fn history(&self) -> Vec<ChatMessage> {
        lock::read(&self.history).clone()
    }

    /// Sends one line of user input.
    ///
    /// Blank input is ignored: nothing is appended and no request is made.
    /// Otherwise the user message is appended before the request starts and
    /// the assistant reply (or an error reply) is appended when it finishes.
    /// Never fails; returns the appended assistant message.
    pub async fn send(&self, user_text: &str) -> Option<ChatMessage> {
        let text = user_text.trim();
        if text.is_empty() {
            return None;
        }

        self.append(ChatMessage::user(text));
        let _busy = BusyGuard::enter(&self.in_flight);

        let model = self.models.current();
        let use_rag = self.registry.toggle().is_active();
        let top_k = self.top_k.resolve();

        let mut request = ChatRequest::new(
            model,
            vec![Message::system(&self.system_prompt), Message::user(text)],
        )
        .with_temperature(self.temperature());
        if use_rag {
            request = request.with_retrieval(top_k);
        }
        debug!(model = %request.model, use_rag, top_k, "Sending chat request");

        self.display.clear();

        let reply = match self.backend.chat(request).await {
            Ok(response) => {
                let content = response
                    .content()
                    .filter(|c| !c.is_empty())
                    .unwrap_or(EMPTY_REPLY)
                    .to_string();

                if use_rag || response.rag_context.is_some() {
                    self.display
                        .render(Some(response.rag_context.as_deref().unwrap_or_default()));
                } else {
                    self.display.clear();
                }
                ChatMessage::assistant(content)
            }
            Err(e) => {
                let err = ClientError::from(e);
                warn!(error = %err, "Chat request failed");
                self.display.clear();
                ChatMessage::assistant(format!("Error: {err}\n{TROUBLESHOOTING_HINT}"))
            }
        };

        self.append(reply.clone());
        self.notify(&reply);
        Some(reply)
    }

    fn append(&self, message: ChatMessage) {
        lock::write(&self.history).push(message);
    }

    fn notify(&self, message: &ChatMessage) {
        let listeners = lock::read(&self.listeners).clone();
        for listener in listeners {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
                listener.on_assistant_message(message)
            }));
            match outcome {
                Ok(Ok(())) => {}
                Ok(Err(e)) => warn!(error = %e, "Assistant listener failed"),
                Err(_) => warn!("Assistant listener panicked"),
            }
        }
    }
}

/// Marks a request in flight for as long as it lives.
struct BusyGuard<'a> {
    counter: &'a AtomicUsize,
}

impl<'a> BusyGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self { counter }
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_busy_guard_balances() {
        let counter = AtomicUsize::new(0);
        {
            let _a = BusyGuard::enter(&counter);
            let _b = BusyGuard::enter(&counter);
            assert_eq!(counter.load(Ordering::SeqCst), 2);
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
