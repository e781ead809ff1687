//! Document ingestion: read → chunk → embed → upsert.
//!
//! Re-ingesting a document replaces it: points previously stored for the
//! same `source` are deleted before the new chunks are written.

use tracing::{debug, info};
use uuid::Uuid;

use crate::config::RagConfig;
use crate::documents::DocumentStore;
use crate::embed::EmbeddingsProvider;
use crate::embed_pool::embed_all;
use crate::errors::RagError;
use crate::vector_index::{ChunkPayload, VectorIndex, VectorPoint};
use crate::chunking::chunk_text;

const EMBED_CONCURRENCY: usize = 4;

/// Outcome of a single document ingestion.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub source: String,
    /// Points removed for the same source before writing.
    pub replaced: u64,
    /// Points written.
    pub inserted: u64,
}

/// Deterministic UUIDv5 point id for the `index`-th chunk of `source`.
pub fn point_id(source: &str, index: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{source}#{index}").as_bytes()).to_string()
}

/// Ingests `name` from the document directory into the vector index.
///
/// # Errors
/// - [`RagError::NotFound`] / [`RagError::InvalidName`] for bad names
/// - embedding or index failures
pub async fn ingest_document(
    cfg: &RagConfig,
    documents: &DocumentStore,
    index: &dyn VectorIndex,
    embedder: &dyn EmbeddingsProvider,
    name: &str,
) -> Result<IngestReport, RagError> {
    let source = documents.source_of(name)?;
    let text = documents.read_text(name).await?;
    let chunks = chunk_text(&text, cfg.chunking);
    info!(%source, chunks = chunks.len(), "ingesting document");

    let vectors = embed_all(&chunks, embedder, EMBED_CONCURRENCY).await?;

    index.ensure_collection(embedder.dim()).await?;
    let replaced = index.delete_by_source(&source).await?;
    if replaced > 0 {
        debug!(%source, replaced, "replacing previous points");
    }

    let points: Vec<VectorPoint> = chunks
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (text, vector))| {
            let id = point_id(&source, i);
            VectorPoint {
                id: id.clone(),
                vector,
                payload: ChunkPayload {
                    source: source.clone(),
                    text,
                    pk: id,
                },
            }
        })
        .collect();

    let mut inserted = 0u64;
    let batch = cfg.upsert_batch.max(1);
    let mut points = points.into_iter().peekable();
    while points.peek().is_some() {
        let chunk: Vec<VectorPoint> = points.by_ref().take(batch).collect();
        inserted += index.upsert(chunk).await?;
    }

    info!(%source, replaced, inserted, "document ingested");
    Ok(IngestReport {
        source,
        replaced,
        inserted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkingConfig, MEMORY_URI};
    use crate::embed::HashEmbedder;
    use crate::vector_index::MemoryVectorIndex;

    fn setup(dir: &std::path::Path) -> (RagConfig, DocumentStore) {
        let mut cfg = RagConfig::new_default(MEMORY_URI, dir);
        cfg.space.size = 64;
        cfg.chunking = ChunkingConfig {
            size: 40,
            overlap: 5,
        };
        cfg.upsert_batch = 2;
        let docs = DocumentStore::new(dir, cfg.file_types.clone());
        (cfg, docs)
    }

    #[test]
    fn point_ids_are_stable() {
        assert_eq!(point_id("data/a.txt", 0), point_id("data/a.txt", 0));
        assert_ne!(point_id("data/a.txt", 0), point_id("data/a.txt", 1));
    }

    #[tokio::test]
    async fn reingesting_replaces_previous_points() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("a.txt"),
            "first paragraph here\n\nsecond paragraph here\n\nthird one",
        )
        .unwrap();
        let (cfg, docs) = setup(dir.path());
        let index = MemoryVectorIndex::new();
        let emb = HashEmbedder::new(64);

        let first = ingest_document(&cfg, &docs, &index, &emb, "a.txt").await.unwrap();
        assert!(first.inserted >= 2);
        assert_eq!(first.replaced, 0);

        std::fs::write(dir.path().join("a.txt"), "short now").unwrap();
        let second = ingest_document(&cfg, &docs, &index, &emb, "a.txt").await.unwrap();
        assert_eq!(second.replaced, first.inserted);
        assert_eq!(second.inserted, 1);
        assert_eq!(index.len().await, 1);
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let (cfg, docs) = setup(dir.path());
        let err = ingest_document(
            &cfg,
            &docs,
            &MemoryVectorIndex::new(),
            &HashEmbedder::new(64),
            "nope.txt",
        )
        .await
        .unwrap_err();
        assert!(matches!(err, RagError::NotFound(_)));
    }
}
