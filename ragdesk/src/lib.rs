//! ragdesk - Chat client for a local LLM backend with a RAG knowledge base
//!
//! This is the convenience wrapper crate that re-exports the ragdesk components.
//!
//! # Quick Start
//!
//! ```toml
//! [dependencies]
//! ragdesk = "0.1"
//! ```
//!
//! ```no_run
//! use ragdesk::prelude::*;
//!
//! # async fn example() {
//! let session = Session::connect(Config::load_or_default());
//! session.init().await;
//! session.registry().add_text("Raspberry Pi 5 har 8 GB RAM.").await;
//! session.chat().send("Hur mycket minne har en Pi 5?").await;
//! # }
//! ```

// Re-export core
pub use ragdesk_core::*;

/// Prelude module for convenient imports
pub mod prelude {
    pub use ragdesk_core::{
        AssistantListener, Backend, ChatMessage, ClientError, Config, Role, Session, Status,
        Upload,
    };
}
