//! Embedding executor with bounded concurrency and dimension checks.

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::{embed::EmbeddingsProvider, errors::RagError};

/// Embeds every text, preserving input order.
///
/// # Errors
/// Returns [`RagError::VectorSizeMismatch`] if a vector does not have
/// `provider.dim()` components, or the first provider error.
pub async fn embed_all(
    texts: &[String],
    provider: &dyn EmbeddingsProvider,
    concurrency: usize,
) -> Result<Vec<Vec<f32>>, RagError> {
    debug!(total = texts.len(), concurrency, "embedding texts");

    let futures: Vec<_> = texts.iter().map(|t| provider.embed(t)).collect();
    let vectors: Vec<Vec<f32>> = stream::iter(futures)
        .buffered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await
        .into_iter()
        .collect::<Result<_, RagError>>()?;

    let want = provider.dim();
    if let Some(bad) = vectors.iter().find(|v| v.len() != want) {
        return Err(RagError::VectorSizeMismatch {
            got: bad.len(),
            want,
        });
    }
    Ok(vectors)
}
