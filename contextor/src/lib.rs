//! Retrieval + generation engine behind document-grounded chat.
//!
//! - [`ChatBackend`]: the backend adapter; [`LocalBackend`] (raw completion
//!   with role tokens) or [`CloudBackend`] (chat completion)
//! - [`HybridRetriever`]: vector + BM25 retrieval with a swappable keyword index
//! - [`DocumentStoreManager`]: ordered deletion across index, storage and keyword index
//! - [`handle_chat`]: one chat turn into a canonical [`conversation::InteractionResult`]
//!
//! [`Contextor::bootstrap`] builds everything once from [`ContextorConfig`].

pub mod backend;
pub mod cfg;
pub mod chat;
pub mod cloud;
pub mod error;
pub mod llm;
pub mod local;
pub mod prompt;
pub mod retrieve;
pub mod rewrite_loop;
pub mod store_manager;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use ai_llm_service::config::default_config::{config_chat, config_embedding, config_local_generation};
use ai_llm_service::error_handler::opt_env;
use ai_llm_service::services::{ollama_service::OllamaService, open_ai_service::OpenAiService};
use ai_llm_service::LlmProvider;
use rag_store::{EmbeddingsProvider, HashEmbedder, LlmEmbedder, RagStore};
use tracing::info;

pub use backend::{ChatBackend, RagEngine};
pub use cfg::{BackendKind, ContextorConfig, RetrievalSettings, RewriteSettings};
pub use chat::handle_chat;
pub use cloud::CloudBackend;
pub use error::ContextorError;
pub use llm::LanguageModel;
pub use local::LocalBackend;
pub use retrieve::HybridRetriever;
pub use store_manager::DocumentStoreManager;

/// Process-wide services, built once at startup.
pub struct Contextor {
    pub config: ContextorConfig,
    pub backend: Arc<dyn ChatBackend>,
    pub documents: Arc<DocumentStoreManager>,
}

impl Contextor {
    /// Builds the embedder and model named by the environment, then the
    /// backend variant selected by `cfg.backend`.
    ///
    /// `embedding_provider=hash` selects the offline [`HashEmbedder`].
    pub async fn bootstrap(cfg: ContextorConfig) -> Result<Self, ContextorError> {
        let dim = cfg.rag.space.size;
        let embedder: Arc<dyn EmbeddingsProvider> = match opt_env("embedding_provider") {
            Some(p) if p.eq_ignore_ascii_case("hash") => Arc::new(HashEmbedder::new(dim)),
            _ => Arc::new(LlmEmbedder::new(config_embedding()?, dim)?),
        };

        let model: Arc<dyn LanguageModel> = match cfg.backend {
            BackendKind::Local => Arc::new(OllamaService::new(config_local_generation()?)?),
            BackendKind::Cloud(LlmProvider::Ollama) => {
                Arc::new(OllamaService::new(config_chat(LlmProvider::Ollama)?)?)
            }
            BackendKind::Cloud(LlmProvider::OpenAI) => {
                Arc::new(OpenAiService::new(config_chat(LlmProvider::OpenAI)?)?)
            }
        };

        Self::with_parts(cfg, embedder, model).await
    }

    /// Builds the services from explicit embedder and model.
    pub async fn with_parts(
        cfg: ContextorConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self, ContextorError> {
        cfg.validate()?;
        let store = Arc::new(RagStore::open(cfg.rag.clone(), embedder).await?);
        let documents = store.documents().clone();
        let index = store.index().clone();

        let retriever = HybridRetriever::new(store, cfg.retrieval).await?;
        let engine = RagEngine::new(retriever, model, cfg.rewrite, cfg.retrieval.max_ctx_chars);

        let backend: Arc<dyn ChatBackend> = match cfg.backend {
            BackendKind::Local => Arc::new(LocalBackend::new(engine, cfg.tokens.clone())),
            BackendKind::Cloud(_) => Arc::new(CloudBackend::new(engine)),
        };
        info!(backend = ?cfg.backend, rewrite = cfg.rewrite.enabled, "backend ready");

        let documents = Arc::new(DocumentStoreManager::new(documents, index, backend.clone()));
        Ok(Self {
            config: cfg,
            backend,
            documents,
        })
    }
}
