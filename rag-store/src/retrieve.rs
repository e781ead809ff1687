//! Hybrid retrieval: fuse vector and keyword candidates into one ranking.
//!
//! Each channel is min-max normalised to `[0, 1]` independently, then
//! combined as `alpha * vector + (1 - alpha) * keyword`. A candidate found by
//! only one channel scores `0` on the other. Candidates are keyed by
//! `(source, text)` so a chunk found by both channels appears once.

use std::collections::HashMap;

use crate::keyword::KeywordHit;
use crate::vector_index::VectorHit;

/// A fused retrieval result.
#[derive(Clone, Debug, PartialEq)]
pub struct RetrievedChunk {
    pub source: String,
    pub text: String,
    /// Vector point id, when the vector channel saw this chunk.
    pub pk: Option<String>,
    /// Fused score in `[0, 1]`.
    pub score: f64,
}

/// Min-max normalise scores to [0, 1]. A flat list normalises to 1.0.
pub fn normalize_scores(raw: &[f64]) -> Vec<f64> {
    if raw.is_empty() {
        return Vec::new();
    }
    let s_min = raw.iter().copied().fold(f64::INFINITY, f64::min);
    let s_max = raw.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    raw.iter()
        .map(|s| {
            if (s_max - s_min).abs() < f64::EPSILON {
                1.0
            } else {
                (s - s_min) / (s_max - s_min)
            }
        })
        .collect()
}

/// Fuses both channels and returns at most `limit` chunks, best first.
pub fn hybrid_fuse(
    vector_hits: &[VectorHit],
    keyword_hits: &[KeywordHit],
    alpha: f64,
    limit: usize,
) -> Vec<RetrievedChunk> {
    let alpha = alpha.clamp(0.0, 1.0);

    struct Acc {
        chunk: RetrievedChunk,
        vector: f64,
        keyword: f64,
        first_seen: usize,
    }
    let mut by_key: HashMap<(String, String), Acc> = HashMap::new();
    let mut order = 0usize;

    let vnorm = normalize_scores(&vector_hits.iter().map(|h| h.score as f64).collect::<Vec<_>>());
    for (hit, norm) in vector_hits.iter().zip(vnorm) {
        let key = (hit.payload.source.clone(), hit.payload.text.clone());
        let acc = by_key.entry(key).or_insert_with(|| {
            order += 1;
            Acc {
                chunk: RetrievedChunk {
                    source: hit.payload.source.clone(),
                    text: hit.payload.text.clone(),
                    pk: Some(hit.payload.pk.clone()),
                    score: 0.0,
                },
                vector: 0.0,
                keyword: 0.0,
                first_seen: order,
            }
        });
        acc.vector = acc.vector.max(norm);
    }

    let knorm = normalize_scores(&keyword_hits.iter().map(|h| h.score).collect::<Vec<_>>());
    for (hit, norm) in keyword_hits.iter().zip(knorm) {
        let key = (hit.source.clone(), hit.text.clone());
        let acc = by_key.entry(key).or_insert_with(|| {
            order += 1;
            Acc {
                chunk: RetrievedChunk {
                    source: hit.source.clone(),
                    text: hit.text.clone(),
                    pk: None,
                    score: 0.0,
                },
                vector: 0.0,
                keyword: 0.0,
                first_seen: order,
            }
        });
        acc.keyword = acc.keyword.max(norm);
    }

    let mut fused: Vec<Acc> = by_key
        .into_values()
        .map(|mut a| {
            a.chunk.score = alpha * a.vector + (1.0 - alpha) * a.keyword;
            a
        })
        .collect();
    fused.sort_by(|a, b| {
        b.chunk
            .score
            .partial_cmp(&a.chunk.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.first_seen.cmp(&b.first_seen))
    });
    fused.truncate(limit);
    fused.into_iter().map(|a| a.chunk).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_index::ChunkPayload;

    fn vhit(score: f32, source: &str, text: &str, pk: &str) -> VectorHit {
        VectorHit {
            score,
            payload: ChunkPayload {
                source: source.into(),
                text: text.into(),
                pk: pk.into(),
            },
        }
    }

    fn khit(score: f64, source: &str, text: &str) -> KeywordHit {
        KeywordHit {
            score,
            source: source.into(),
            text: text.into(),
        }
    }

    #[test]
    fn normalization_bounds() {
        assert_eq!(normalize_scores(&[2.0, 4.0, 3.0]), vec![0.0, 1.0, 0.5]);
        assert_eq!(normalize_scores(&[7.0, 7.0]), vec![1.0, 1.0]);
        assert!(normalize_scores(&[]).is_empty());
    }

    #[test]
    fn shared_chunk_is_merged_and_keeps_pk() {
        let v = vec![vhit(0.9, "a", "alpha", "p1"), vhit(0.1, "b", "beta", "p2")];
        let k = vec![khit(3.0, "a", "alpha"), khit(1.0, "c", "gamma")];
        let out = hybrid_fuse(&v, &k, 0.5, 10);

        assert_eq!(out.len(), 3);
        assert_eq!(out[0].source, "a");
        assert_eq!(out[0].pk.as_deref(), Some("p1"));
        assert!((out[0].score - 1.0).abs() < 1e-9);
        let gamma = out.iter().find(|c| c.source == "c").unwrap();
        assert!(gamma.pk.is_none());
    }

    #[test]
    fn alpha_one_ignores_keywords() {
        let v = vec![vhit(0.2, "a", "x", "p1"), vhit(0.8, "b", "y", "p2")];
        let k = vec![khit(10.0, "a", "x")];
        let out = hybrid_fuse(&v, &k, 1.0, 1);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].source, "b");
    }
}
