//! Backend adapter contract and the engine shared by both variants.

use std::sync::Arc;

use conversation::{ConversationTurn, EnvelopeShape, RawHistory, ResponseEnvelope};
use futures::future::BoxFuture;
use rag_store::IngestReport;
use tracing::{info, instrument};

use crate::cfg::RewriteSettings;
use crate::error::ContextorError;
use crate::llm::LanguageModel;
use crate::prompt::render_context;
use crate::retrieve::HybridRetriever;
use crate::rewrite_loop::{Resolved, resolve_question};

/// A retrieval + generation engine.
///
/// Exactly one implementation serves a process. Implementations differ in
/// the envelope they produce, which [`ChatBackend::shape`] describes.
pub trait ChatBackend: Send + Sync {
    /// Envelope shape produced by [`ChatBackend::handle_interaction`].
    fn shape(&self) -> EnvelopeShape;

    /// Retrieves, generates and returns the backend-shaped history and envelope.
    ///
    /// # Errors
    /// [`ContextorError::EngineFailure`] when retrieval or generation fails.
    fn handle_interaction<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a [ConversationTurn],
    ) -> BoxFuture<'a, Result<(RawHistory, ResponseEnvelope), ContextorError>>;

    /// Ingests a document from the document directory. Re-adding replaces.
    fn add_document<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<(), ContextorError>>;

    /// Rebuilds the in-memory keyword index from storage.
    fn reload(&self) -> BoxFuture<'_, Result<(), ContextorError>>;
}

/// Retrieval, rewrite loop and ingestion shared by the Local and Cloud backends.
pub struct RagEngine {
    retriever: HybridRetriever,
    model: Arc<dyn LanguageModel>,
    rewrite: RewriteSettings,
    max_ctx_chars: usize,
}

impl RagEngine {
    pub fn new(
        retriever: HybridRetriever,
        model: Arc<dyn LanguageModel>,
        rewrite: RewriteSettings,
        max_ctx_chars: usize,
    ) -> Self {
        Self {
            retriever,
            model,
            rewrite,
            max_ctx_chars,
        }
    }

    pub fn model(&self) -> &dyn LanguageModel {
        self.model.as_ref()
    }

    pub fn retriever(&self) -> &HybridRetriever {
        &self.retriever
    }

    /// Documents for `question`, after the rewrite loop when it is enabled.
    pub async fn resolve(&self, question: &str) -> Result<Resolved, ContextorError> {
        let resolved = if self.rewrite.enabled {
            resolve_question(
                self.model.as_ref(),
                &self.retriever,
                question,
                self.rewrite.max_attempts,
                self.max_ctx_chars,
            )
            .await
        } else {
            self.retriever.retrieve(question).await.map(|docs| Resolved {
                question: question.to_string(),
                docs,
                attempts: 0,
            })
        };
        resolved.map_err(|e| match e {
            e @ ContextorError::EngineFailure(_) => e,
            other => ContextorError::engine(other),
        })
    }

    pub fn render_context(&self, resolved: &Resolved) -> String {
        render_context(&resolved.docs, self.max_ctx_chars)
    }

    /// Ingests `filename`, then rebuilds the keyword index.
    #[instrument(skip(self))]
    pub async fn add_document(&self, filename: &str) -> Result<IngestReport, ContextorError> {
        let report = self.retriever.store().ingest(filename).await?;
        self.retriever.reload().await?;
        info!(
            source = %report.source,
            replaced = report.replaced,
            inserted = report.inserted,
            "document added"
        );
        Ok(report)
    }

    pub async fn reload(&self) -> Result<usize, ContextorError> {
        self.retriever.reload().await
    }
}
