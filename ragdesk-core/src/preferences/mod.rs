//! User preferences that survive restarts.
//!
//! Three independent settings are kept: the selected model, whether retrieval
//! is enabled, and the retrieval top-K. Each has a key, a default and a
//! validity predicate. An absent or invalid stored value reads as the default
//! and is not written back; persistence only happens on an explicit change.

mod store;

pub use store::{FileStore, KeyValueStore, MemoryStore, StorageError};

use std::sync::Arc;
use tracing::debug;

pub const MODEL_KEY: &str = "ragdesk.model";
pub const RAG_ENABLED_KEY: &str = "ragdesk.rag_enabled";
pub const RAG_TOP_K_KEY: &str = "ragdesk.rag_top_k";

/// Smallest and largest top-K the server accepts.
pub const MIN_TOP_K: usize = 1;
pub const MAX_TOP_K: usize = 10;

/// Failure-tolerant view over a [`KeyValueStore`].
///
/// Neither `get` nor `set` ever fails: storage errors are logged at debug
/// level and `get` then reports the key as absent. There is no caching, each
/// call goes to the underlying store.
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// In-memory preferences, mostly useful in tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                debug!(key, error = %e, "Preference read failed");
                None
            }
        }
    }

    pub fn set(&self, key: &str, value: &str) {
        if let Err(e) = self.store.set(key, value) {
            debug!(key, error = %e, "Preference write failed");
        }
    }

    /// Stored model name, if any non-empty value is stored.
    pub fn model(&self) -> Option<String> {
        self.get(MODEL_KEY)
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
    }

    pub fn set_model(&self, model: &str) {
        self.set(MODEL_KEY, model);
    }

    /// Stored retrieval flag; `false` unless the literal `"1"` is stored.
    pub fn rag_enabled(&self) -> bool {
        matches!(self.get(RAG_ENABLED_KEY).as_deref(), Some("1"))
    }

    pub fn set_rag_enabled(&self, enabled: bool) {
        self.set(RAG_ENABLED_KEY, if enabled { "1" } else { "0" });
    }

    /// Stored top-K when it is an integer in `1..=10`.
    pub fn top_k(&self) -> Option<usize> {
        self.get(RAG_TOP_K_KEY)
            .and_then(|raw| raw.trim().parse::<usize>().ok())
            .filter(|k| (MIN_TOP_K..=MAX_TOP_K).contains(k))
    }

    pub fn set_top_k(&self, top_k: usize) {
        self.set(RAG_TOP_K_KEY, &top_k.to_string());
    }
}

impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences").finish_non_exhaustive()
    }
}
