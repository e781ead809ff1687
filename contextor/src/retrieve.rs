//! Hybrid retriever: vector search from the store plus an in-memory BM25
//! index that is rebuilt on demand.
//!
//! The keyword index sits behind `RwLock<Arc<_>>`. Searches clone the `Arc`
//! and drop the lock immediately; `reload` builds the replacement without
//! holding the lock and then swaps the pointer, so an in-flight search keeps
//! reading the index it started with.
//!
//! Reloads are serialized on a separate mutex held across build and swap.
//! The last reload to finish therefore always saw the latest storage.

use std::sync::Arc;

use conversation::RetrievedDocument;
use conversation::citations::{PK_KEY, PROVENANCE_KEY, SOURCE_KEY};
use rag_store::{KeywordIndex, RagStore, RetrievedChunk, hybrid_fuse};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::cfg::RetrievalSettings;
use crate::error::ContextorError;

pub struct HybridRetriever {
    store: Arc<RagStore>,
    keyword: RwLock<Arc<KeywordIndex>>,
    rebuild: Mutex<()>,
    settings: RetrievalSettings,
}

impl HybridRetriever {
    /// Builds the keyword index from the current document directory.
    pub async fn new(store: Arc<RagStore>, settings: RetrievalSettings) -> Result<Self, ContextorError> {
        let index = store.build_keyword_index().await?;
        info!(chunks = index.len(), "keyword index ready");
        Ok(Self {
            store,
            keyword: RwLock::new(Arc::new(index)),
            rebuild: Mutex::new(()),
            settings,
        })
    }

    pub fn store(&self) -> &Arc<RagStore> {
        &self.store
    }

    /// Rebuilds the keyword index from storage and swaps it in.
    /// Returns the number of indexed chunks.
    pub async fn reload(&self) -> Result<usize, ContextorError> {
        let _rebuilding = self.rebuild.lock().await;
        let fresh = Arc::new(self.store.build_keyword_index().await?);
        let n = fresh.len();
        *self.keyword.write().await = fresh;
        info!(chunks = n, "keyword index reloaded");
        Ok(n)
    }

    /// Current keyword index snapshot.
    pub async fn keyword_snapshot(&self) -> Arc<KeywordIndex> {
        self.keyword.read().await.clone()
    }

    /// Top documents for `query`, best first, with `source`, `pk` and
    /// `provenance` (fused score) in their metadata.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedDocument>, ContextorError> {
        let vector_hits = self
            .store
            .search_vectors(query, self.settings.vector_k)
            .await?;
        let keyword = self.keyword_snapshot().await;
        let keyword_hits = keyword.search(query, self.settings.keyword_k);

        let fused = hybrid_fuse(
            &vector_hits,
            &keyword_hits,
            self.settings.hybrid_alpha,
            self.settings.limit,
        );
        debug!(
            vector = vector_hits.len(),
            keyword = keyword_hits.len(),
            fused = fused.len(),
            "hybrid retrieval"
        );
        Ok(fused.into_iter().map(to_document).collect())
    }
}

fn to_document(chunk: RetrievedChunk) -> RetrievedDocument {
    let mut doc = RetrievedDocument::new(chunk.text)
        .with_meta(SOURCE_KEY, chunk.source)
        .with_meta(PROVENANCE_KEY, chunk.score);
    if let Some(pk) = chunk.pk {
        doc = doc.with_meta(PK_KEY, pk);
    }
    doc
}
