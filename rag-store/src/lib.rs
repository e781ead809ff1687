//! Storage side of document-grounded chat.
//!
//! This crate provides:
//! - [`DocumentStore`]: the flat document directory (list/read/remove)
//! - [`VectorIndex`]: chunk embeddings in Qdrant ([`QdrantFacade`]) or in memory ([`MemoryVectorIndex`])
//! - [`KeywordIndex`]: an immutable BM25 index rebuilt from the directory
//! - [`hybrid_fuse`]: score fusion of both channels
//!
//! [`RagStore`] wires them together for application code.

mod chunking;
mod config;
mod documents;
mod embed;
mod embed_pool;
mod errors;
mod ingest;
mod keyword;
mod qdrant_facade;
mod retrieve;
mod vector_index;

use std::sync::Arc;

pub use chunking::chunk_text;
pub use config::{ChunkingConfig, DistanceKind, MEMORY_URI, RagConfig, VectorSpace, parse_file_types};
pub use documents::DocumentStore;
pub use embed::{EmbeddingsProvider, HashEmbedder, LlmEmbedder};
pub use errors::RagError;
pub use ingest::{IngestReport, point_id};
pub use keyword::{KeywordDoc, KeywordHit, KeywordIndex};
pub use qdrant_facade::QdrantFacade;
pub use retrieve::{RetrievedChunk, hybrid_fuse, normalize_scores};
pub use vector_index::{ChunkPayload, MemoryVectorIndex, VectorHit, VectorIndex, VectorPoint};

use tracing::{debug, info, trace};

/// High-level facade that wires configuration, documents, vector index and embedder.
///
/// This is the single entry point recommended for application code.
pub struct RagStore {
    cfg: RagConfig,
    documents: DocumentStore,
    index: Arc<dyn VectorIndex>,
    embedder: Arc<dyn EmbeddingsProvider>,
}

impl RagStore {
    /// Assembles a store from explicit parts.
    pub fn new(
        cfg: RagConfig,
        index: Arc<dyn VectorIndex>,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Self {
        let documents = DocumentStore::new(cfg.data_directory.clone(), cfg.file_types.clone());
        Self {
            cfg,
            documents,
            index,
            embedder,
        }
    }

    /// Connects to the vector index selected by `cfg.vector_store_uri` and
    /// makes sure the collection exists.
    ///
    /// # Errors
    /// Returns `RagError::Config` for invalid settings or `RagError::Qdrant`
    /// when the server is unreachable.
    pub async fn open(
        cfg: RagConfig,
        embedder: Arc<dyn EmbeddingsProvider>,
    ) -> Result<Self, RagError> {
        cfg.validate()?;
        if embedder.dim() != cfg.space.size {
            return Err(RagError::VectorSizeMismatch {
                got: embedder.dim(),
                want: cfg.space.size,
            });
        }

        let index: Arc<dyn VectorIndex> = if cfg.uses_memory_index() {
            info!("using in-memory vector index");
            Arc::new(MemoryVectorIndex::new())
        } else {
            info!(uri = %cfg.vector_store_uri, collection = %cfg.collection, "using Qdrant vector index");
            Arc::new(QdrantFacade::new(&cfg)?)
        };
        index.ensure_collection(cfg.space.size).await?;

        Ok(Self::new(cfg, index, embedder))
    }

    pub fn config(&self) -> &RagConfig {
        &self.cfg
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    /// Chunks, embeds and upserts one document (replacing earlier points).
    pub async fn ingest(&self, name: &str) -> Result<IngestReport, RagError> {
        trace!("RagStore::ingest name={name}");
        ingest::ingest_document(
            &self.cfg,
            &self.documents,
            self.index.as_ref(),
            self.embedder.as_ref(),
            name,
        )
        .await
    }

    /// Embeds `query` and returns the top-`k` vector hits.
    pub async fn search_vectors(&self, query: &str, k: u64) -> Result<Vec<VectorHit>, RagError> {
        trace!("RagStore::search_vectors k={k}");
        let v = self.embedder.embed(query).await?;
        self.index.search(v, k).await
    }

    /// Builds a fresh BM25 index over every chunk of every listed document.
    pub async fn build_keyword_index(&self) -> Result<KeywordIndex, RagError> {
        let mut docs = Vec::new();
        let files = self.documents.load_all().await?;
        let n_files = files.len();
        for (name, text) in files {
            let source = self.documents.source_of(&name)?;
            for chunk in chunk_text(&text, self.cfg.chunking) {
                docs.push(KeywordDoc {
                    source: source.clone(),
                    text: chunk,
                });
            }
        }
        debug!(files = n_files, chunks = docs.len(), "keyword index built");
        Ok(KeywordIndex::build(docs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn open_rejects_dimension_mismatch() {
        let cfg = RagConfig::new_default(MEMORY_URI, "data");
        let err = RagStore::open(cfg, Arc::new(HashEmbedder::new(8)))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 8, want: 1024 }));
    }

    #[tokio::test]
    async fn keyword_index_covers_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "the answer is forty two").unwrap();
        std::fs::write(dir.path().join("b.md"), "unrelated notes").unwrap();
        let mut cfg = RagConfig::new_default(MEMORY_URI, dir.path());
        cfg.space.size = 32;
        let store = RagStore::open(cfg, Arc::new(HashEmbedder::new(32))).await.unwrap();

        let kw = store.build_keyword_index().await.unwrap();
        assert_eq!(kw.len(), 2);
        let hits = kw.search("answer", 5);
        assert_eq!(hits.len(), 1);
        assert!(hits[0].source.ends_with("a.txt"));
    }
}
