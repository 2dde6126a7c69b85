//! ragdesk-core - Client for a local LLM chat backend
//!
//! Provides the client-side components of a chat interface with a
//! retrieval-augmented knowledge base:
//! - Model selection with persisted preference
//! - Knowledge base document registry and retrieval toggle
//! - Display of the passages that grounded an answer
//! - Chat session controller with listener hooks (e.g. speech output)
//!
//! ## Primary API
//!
//! Users should interact with the client via the `Session` API.

// Public modules
pub mod api;
pub mod chat;
pub mod config;
pub mod error;
pub mod models;
pub mod preferences;
pub mod rag;
pub mod session;
pub mod speech;
pub mod status;

mod lock;

// Public exports
pub use api::{ApiError, Backend, HttpBackend, Upload};
pub use chat::{AssistantListener, ChatManager, ChatMessage, Role};
pub use config::Config;
pub use error::ClientError;
pub use models::{ModelMenu, ModelOption, ModelSelector};
pub use preferences::{FileStore, KeyValueStore, MemoryStore, Preferences};
pub use rag::{DocumentRegistry, RetrievalDisplay, TopKControl};
pub use session::Session;
pub use speech::SpeechOutput;
pub use status::{Severity, Status};
