//! The contract for the opaque text-generation service.

use async_trait::async_trait;

use crate::error::Result;

/// The author of a [`ModelMessage`] in a generation request.
///
/// Distinct from [`crate::types::Role`]: prompts carry a system turn that
/// never appears in session history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// The fixed behavioral contract for the model.
    System,
    /// A user turn (including synthetic turns carrying retrieved context).
    User,
    /// A prior model turn.
    Assistant,
}

/// One message of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelMessage {
    /// Who authored the message.
    pub role: MessageRole,
    /// The message text.
    pub content: String,
}

impl ModelMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: MessageRole::System, content: content.into() }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: MessageRole::User, content: content.into() }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: MessageRole::Assistant, content: content.into() }
    }
}

/// An opaque generative model service.
///
/// The pipeline invokes the model at most once per conversational turn and
/// performs no retries; failures propagate as
/// [`CdsError::Upstream`](crate::error::CdsError::Upstream).
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// A human-readable identifier for the backing model.
    fn name(&self) -> &str;

    /// Generate a completion for the given message sequence, returning the
    /// raw model text.
    async fn complete(&self, messages: &[ModelMessage]) -> Result<String>;
}
