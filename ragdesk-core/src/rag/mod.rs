//! Retrieval-augmented generation, client side.
//!
//! The server owns the knowledge base: it splits documents into chunks,
//! embeds them and ranks passages. This module keeps the client's view of it
//! consistent:
//!
//! - [`DocumentRegistry`]: lists, adds and removes documents, and owns the
//!   retrieval toggle
//! - [`TopKControl`]: the number of passages to request per question
//! - [`RetrievalDisplay`]: the passages that grounded the latest answer

mod display;
mod registry;
mod top_k;
mod types;

pub use display::{format_score, Excerpt, RetrievalDisplay, RetrievalView};
pub use registry::{DocumentRegistry, DocumentRow, RagToggle, RegistryView};
pub use top_k::{clamp_top_k, TopKControl};
pub use types::{Document, DocumentMetadata, DocumentSource, RetrievalItem, Snapshot};
