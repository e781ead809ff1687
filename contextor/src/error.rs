//! Typed error for the contextor crate.

use ai_llm_service::AiLlmError;
use conversation::ConversationError;
use rag_store::RagError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContextorError {
    /// Retrieval or generation failed while answering.
    #[error("engine failure: {0}")]
    EngineFailure(String),

    /// The backend answered but broke its output contract.
    #[error(transparent)]
    Conversation(#[from] ConversationError),

    /// Requested document is absent from the document directory.
    #[error("document not found: {filename}")]
    NotFound { filename: String },

    /// Document name is empty or escapes the document directory.
    #[error("invalid document name: {0}")]
    InvalidName(String),

    /// Index entries were removed but the file could not be deleted, so the
    /// vector index and storage now disagree.
    #[error("partial delete of {source_path}: {removed} index entries removed, file removal failed: {cause}")]
    PartialDelete {
        source_path: String,
        removed: u64,
        #[source]
        cause: std::io::Error,
    },

    /// Errors from the underlying rag-store crate.
    #[error("RAG error: {0}")]
    Rag(RagError),

    /// Invalid configuration at startup.
    #[error("config error: {0}")]
    Config(String),

    /// LLM client could not be constructed.
    #[error(transparent)]
    Llm(#[from] AiLlmError),
}

impl ContextorError {
    pub fn engine(cause: impl std::fmt::Display) -> Self {
        ContextorError::EngineFailure(cause.to_string())
    }
}

impl From<RagError> for ContextorError {
    fn from(e: RagError) -> Self {
        match e {
            RagError::NotFound(filename) => ContextorError::NotFound { filename },
            RagError::InvalidName(name) => ContextorError::InvalidName(name),
            RagError::Config(msg) => ContextorError::Config(msg),
            other => ContextorError::Rag(other),
        }
    }
}
