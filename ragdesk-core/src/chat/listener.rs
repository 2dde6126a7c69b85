use super::types::ChatMessage;

/// Notified with every assistant message after it is appended to the history.
///
/// Listeners are fire-and-forget: an error or a panic inside one is logged and
/// has no effect on the history, the retrieval display or other listeners.
pub trait AssistantListener: Send + Sync {
    fn on_assistant_message(&self, message: &ChatMessage) -> anyhow::Result<()>;
}

impl<F> AssistantListener for F
where
    F: Fn(&ChatMessage) -> anyhow::Result<()> + Send + Sync,
{
    fn on_assistant_message(&self, message: &ChatMessage) -> anyhow::Result<()> {
        self(message)
    }
}
