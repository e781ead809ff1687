//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for rag-store operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Invalid or unsupported configuration.
    #[error("config error: {0}")]
    Config(String),

    /// A filename that would escape the document directory or is otherwise unusable.
    #[error("invalid document name: {0}")]
    InvalidName(String),

    /// Requested document does not exist in the document directory.
    #[error("document not found: {0}")]
    NotFound(String),

    /// Mismatch between the embedding size and the collection's vector size.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding provider failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// Qdrant client errors (wrapped).
    #[error("qdrant error: {0}")]
    Qdrant(String),
}

impl From<ai_llm_service::AiLlmError> for RagError {
    fn from(e: ai_llm_service::AiLlmError) -> Self {
        RagError::Embedding(e.to_string())
    }
}
