use std::sync::Arc;

use contextor::{ChatBackend, Contextor, DocumentStoreManager};

/// Shared state for all HTTP handlers.
///
/// Built once at startup; the backend variant never changes for the
/// lifetime of the process.
#[derive(Clone)]
pub struct AppState {
    /// Active retrieval + generation backend (Local or Cloud).
    pub backend: Arc<dyn ChatBackend>,
    /// Listing, download and ordered deletion of documents.
    pub documents: Arc<DocumentStoreManager>,
    /// Whether the rewrite loop may report a rephrased question.
    pub rewrite_enabled: bool,
}

impl AppState {
    pub fn new(contextor: &Contextor) -> Self {
        Self {
            backend: contextor.backend.clone(),
            documents: contextor.documents.clone(),
            rewrite_enabled: contextor.config.rewrite.enabled,
        }
    }
}
