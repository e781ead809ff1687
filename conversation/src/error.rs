//! Errors raised while turning a backend envelope into canonical output.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConversationError {
    /// The backend broke its output contract (missing delimiter, missing or
    /// mistyped field, unknown role).
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

impl ConversationError {
    pub fn malformed(reason: impl Into<String>) -> Self {
        ConversationError::MalformedEnvelope(reason.into())
    }
}
