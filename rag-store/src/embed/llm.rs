//! Embedding provider backed by `ai-llm-service` (Ollama or OpenAI).

use ai_llm_service::{
    AiLlmError, LlmModelConfig, LlmProvider,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};
use futures::future::BoxFuture;
use tracing::warn;

use super::EmbeddingsProvider;
use crate::errors::RagError;

enum Client {
    Ollama(OllamaService),
    OpenAi(OpenAiService),
}

/// Remote embedding provider with a dimension check on every response.
pub struct LlmEmbedder {
    client: Client,
    dim: usize,
}

impl LlmEmbedder {
    /// Builds the provider for `cfg.provider`.
    pub fn new(cfg: LlmModelConfig, dim: usize) -> Result<Self, AiLlmError> {
        let client = match cfg.provider {
            LlmProvider::Ollama => Client::Ollama(OllamaService::new(cfg)?),
            LlmProvider::OpenAI => Client::OpenAi(OpenAiService::new(cfg)?),
        };
        Ok(Self { client, dim })
    }
}

impl EmbeddingsProvider for LlmEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move {
            let v = match &self.client {
                Client::Ollama(s) => s.embeddings(text).await?,
                Client::OpenAi(s) => s.embeddings(text).await?,
            };
            if v.len() != self.dim {
                warn!(got = v.len(), want = self.dim, "embedding size mismatch");
                return Err(RagError::VectorSizeMismatch {
                    got: v.len(),
                    want: self.dim,
                });
            }
            Ok(v)
        })
    }
}
