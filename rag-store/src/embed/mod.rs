//! Embedding abstraction.
//!
//! Async is required because real providers (Ollama, OpenAI) perform HTTP
//! requests; the boxed future keeps the trait object-safe.

use futures::future::BoxFuture;

use crate::errors::RagError;

pub mod hash;
pub mod llm;

pub use hash::HashEmbedder;
pub use llm::LlmEmbedder;

/// Provider interface for embedding generation.
///
/// Implement this trait to plug in your own embedding backend.
pub trait EmbeddingsProvider: Send + Sync {
    /// Dimension of the vectors this provider returns.
    fn dim(&self) -> usize;

    /// Async embedding function.
    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>>;
}
