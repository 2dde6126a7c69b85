//! Chat session controller.

mod listener;
mod manager;
mod types;

pub use listener::AssistantListener;
pub use manager::{ChatManager, EMPTY_REPLY, TROUBLESHOOTING_HINT};
pub use types::{ChatMessage, Role};
