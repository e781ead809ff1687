//! Deterministic feature-hashing embedder.
//!
//! Needs no model server: each token is hashed into one of `dim` buckets and
//! the result is L2-normalised. Texts sharing words get similar vectors,
//! which is enough for offline runs with the in-memory index and for tests.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use futures::future::BoxFuture;

use super::EmbeddingsProvider;
use crate::errors::RagError;
use crate::keyword::tokenize;

#[derive(Clone, Debug)]
pub struct HashEmbedder {
    dim: usize,
}

impl HashEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_sync(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dim];
        for token in tokenize(text) {
            let mut h = DefaultHasher::new();
            token.hash(&mut h);
            let bucket = (h.finish() % self.dim as u64) as usize;
            v[bucket] += 1.0;
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            v.iter_mut().for_each(|x| *x /= norm);
        }
        v
    }
}

impl EmbeddingsProvider for HashEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed<'a>(&'a self, text: &'a str) -> BoxFuture<'a, Result<Vec<f32>, RagError>> {
        Box::pin(async move { Ok(self.embed_sync(text)) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::cosine_similarity;

    #[test]
    fn similar_texts_are_closer() {
        let e = HashEmbedder::new(256);
        let a = e.embed_sync("rust ownership and borrowing");
        let b = e.embed_sync("borrowing rules in rust");
        let c = e.embed_sync("baking sourdough bread");
        assert_eq!(a.len(), 256);
        assert!(cosine_similarity(&a, &b) > cosine_similarity(&a, &c));
    }
}
