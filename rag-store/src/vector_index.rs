//! Vector index abstraction and the in-process implementation.
//!
//! The trait mirrors the lifecycle of a remote collection: it must be
//! loaded before mutation and released afterwards. Implementations where
//! loading is implicit (Qdrant) treat load/release as cheap checks.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::errors::RagError;

/// Payload stored alongside every vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChunkPayload {
    /// Canonical storage path of the originating document.
    pub source: String,
    /// Chunk text.
    pub text: String,
    /// Primary key of the point (same as its id).
    pub pk: String,
}

/// A point to upsert.
#[derive(Clone, Debug)]
pub struct VectorPoint {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: ChunkPayload,
}

/// A similarity search hit, best first.
#[derive(Clone, Debug, PartialEq)]
pub struct VectorHit {
    pub score: f32,
    pub payload: ChunkPayload,
}

/// Storage backend for chunk embeddings.
pub trait VectorIndex: Send + Sync {
    /// Creates the collection with the given vector size if it does not exist.
    fn ensure_collection(&self, dim: usize) -> BoxFuture<'_, Result<(), RagError>>;

    /// Loads the collection for use. Returns `false` if it does not exist.
    fn load_collection(&self) -> BoxFuture<'_, Result<bool, RagError>>;

    /// Releases a previously loaded collection.
    fn release_collection(&self) -> BoxFuture<'_, Result<(), RagError>>;

    /// Number of points whose payload `source` equals `source` exactly.
    fn count_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>>;

    /// Deletes every point whose payload `source` equals `source` exactly.
    /// Returns the number of removed points.
    fn delete_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>>;

    /// Inserts or replaces points by id. Returns the number written.
    fn upsert(&self, points: Vec<VectorPoint>) -> BoxFuture<'_, Result<u64, RagError>>;

    /// Top-`k` nearest points for `vector`.
    fn search(&self, vector: Vec<f32>, k: u64) -> BoxFuture<'_, Result<Vec<VectorHit>, RagError>>;
}

/// In-process vector index (cosine similarity, brute force).
///
/// Selected with `vector_store_uri = memory://`; also the index used by tests.
#[derive(Debug, Default)]
pub struct MemoryVectorIndex {
    points: RwLock<HashMap<String, (Vec<f32>, ChunkPayload)>>,
    dim: RwLock<Option<usize>>,
    holders: AtomicUsize,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding `load_collection` calls not yet released.
    pub fn holders(&self) -> usize {
        self.holders.load(Ordering::SeqCst)
    }

    /// Total number of stored points.
    pub async fn len(&self) -> usize {
        self.points.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.points.read().await.is_empty()
    }
}

impl VectorIndex for MemoryVectorIndex {
    fn ensure_collection(&self, dim: usize) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(async move {
            let mut guard = self.dim.write().await;
            match *guard {
                Some(existing) if existing != dim => Err(RagError::VectorSizeMismatch {
                    got: dim,
                    want: existing,
                }),
                Some(_) => Ok(()),
                None => {
                    *guard = Some(dim);
                    Ok(())
                }
            }
        })
    }

    fn load_collection(&self) -> BoxFuture<'_, Result<bool, RagError>> {
        Box::pin(async move {
            self.holders.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        })
    }

    fn release_collection(&self) -> BoxFuture<'_, Result<(), RagError>> {
        Box::pin(async move {
            // Saturating: releasing an unloaded collection is a no-op.
            let _ = self
                .holders
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| h.checked_sub(1));
            Ok(())
        })
    }

    fn count_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let points = self.points.read().await;
            Ok(points.values().filter(|(_, p)| p.source == source).count() as u64)
        })
    }

    fn delete_by_source<'a>(&'a self, source: &'a str) -> BoxFuture<'a, Result<u64, RagError>> {
        Box::pin(async move {
            let mut points = self.points.write().await;
            let before = points.len();
            points.retain(|_, (_, p)| p.source != source);
            let removed = (before - points.len()) as u64;
            debug!(%source, removed, "memory index delete");
            Ok(removed)
        })
    }

    fn upsert(&self, points: Vec<VectorPoint>) -> BoxFuture<'_, Result<u64, RagError>> {
        Box::pin(async move {
            let dim = *self.dim.read().await;
            let mut store = self.points.write().await;
            let n = points.len() as u64;
            for p in points {
                if let Some(want) = dim {
                    if p.vector.len() != want {
                        return Err(RagError::VectorSizeMismatch {
                            got: p.vector.len(),
                            want,
                        });
                    }
                }
                store.insert(p.id, (p.vector, p.payload));
            }
            trace!(n, total = store.len(), "memory index upsert");
            Ok(n)
        })
    }

    fn search(&self, vector: Vec<f32>, k: u64) -> BoxFuture<'_, Result<Vec<VectorHit>, RagError>> {
        Box::pin(async move {
            let points = self.points.read().await;
            let mut hits: Vec<VectorHit> = points
                .values()
                .map(|(v, p)| VectorHit {
                    score: cosine_similarity(&vector, v),
                    payload: p.clone(),
                })
                .collect();
            hits.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.payload.pk.cmp(&b.payload.pk))
            });
            hits.truncate(k as usize);
            Ok(hits)
        })
    }
}

/// Cosine similarity; `0.0` for empty, mismatched or zero vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut na = 0.0f32;
    let mut nb = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        na += x * x;
        nb += y * y;
    }
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot / (na.sqrt() * nb.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(id: &str, source: &str, v: Vec<f32>) -> VectorPoint {
        VectorPoint {
            id: id.into(),
            vector: v,
            payload: ChunkPayload {
                source: source.into(),
                text: format!("text of {id}"),
                pk: id.into(),
            },
        }
    }

    #[tokio::test]
    async fn delete_by_source_counts_exact_matches() {
        let idx = MemoryVectorIndex::new();
        idx.ensure_collection(2).await.unwrap();
        idx.upsert(vec![
            point("1", "data/a.txt", vec![1.0, 0.0]),
            point("2", "data/a.txt", vec![0.0, 1.0]),
            point("3", "data/a.txt.bak", vec![1.0, 1.0]),
        ])
        .await
        .unwrap();

        assert_eq!(idx.count_by_source("data/a.txt").await.unwrap(), 2);
        assert_eq!(idx.delete_by_source("data/a.txt").await.unwrap(), 2);
        assert_eq!(idx.len().await, 1);
        assert_eq!(idx.delete_by_source("data/a.txt").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn search_orders_by_similarity() {
        let idx = MemoryVectorIndex::new();
        idx.upsert(vec![
            point("x", "s", vec![1.0, 0.0]),
            point("y", "s", vec![0.0, 1.0]),
        ])
        .await
        .unwrap();
        let hits = idx.search(vec![0.9, 0.1], 2).await.unwrap();
        assert_eq!(hits[0].payload.pk, "x");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn dimension_is_enforced() {
        let idx = MemoryVectorIndex::new();
        idx.ensure_collection(3).await.unwrap();
        let err = idx.upsert(vec![point("1", "s", vec![1.0])]).await.unwrap_err();
        assert!(matches!(err, RagError::VectorSizeMismatch { got: 1, want: 3 }));
    }

    #[tokio::test]
    async fn load_release_are_balanced() {
        let idx = MemoryVectorIndex::new();
        assert!(idx.load_collection().await.unwrap());
        assert_eq!(idx.holders(), 1);
        idx.release_collection().await.unwrap();
        idx.release_collection().await.unwrap();
        assert_eq!(idx.holders(), 0);
    }

    #[test]
    fn cosine_handles_degenerate_vectors() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
    }
}
