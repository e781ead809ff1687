//! Runtime and collection configuration.

use std::path::PathBuf;

use ai_llm_service::error_handler::opt_env;

use crate::errors::RagError;

/// URI scheme that selects the in-process vector index instead of Qdrant.
pub const MEMORY_URI: &str = "memory://";

const DEFAULT_FILE_TYPES: &str = "pdf,json,docx,pptx,xslx,csv,txt,md";

/// Distance function used for the vector space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DistanceKind {
    /// Cosine distance (recommended for most embeddings).
    Cosine,
    /// Dot product (useful for normalized vectors).
    Dot,
    /// Euclidean distance (L2).
    Euclid,
}

/// Describes the vector space of the collection.
#[derive(Clone, Debug)]
pub struct VectorSpace {
    /// Dimensionality of vectors.
    pub size: usize,
    /// Distance function.
    pub distance: DistanceKind,
}

/// Chunker settings, in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChunkingConfig {
    pub size: usize,
    pub overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            size: 1200,
            overlap: 120,
        }
    }
}

/// Configuration for document storage, ingestion and retrieval.
#[derive(Clone, Debug)]
pub struct RagConfig {
    /// Qdrant gRPC endpoint, e.g. `http://localhost:6334`, or `memory://`.
    pub vector_store_uri: String,
    /// Optional API key for Qdrant Cloud.
    pub qdrant_api_key: Option<String>,
    /// Target collection name.
    pub collection: String,
    /// Vector space of the collection.
    pub space: VectorSpace,
    /// Upsert batch size (typical range: 64..512).
    pub upsert_batch: usize,
    /// Root directory holding the documents.
    pub data_directory: PathBuf,
    /// Allowed file extensions, lowercase, without the dot.
    pub file_types: Vec<String>,
    /// Chunker settings.
    pub chunking: ChunkingConfig,
}

impl RagConfig {
    /// Creates a sane default config for a given vector store and document root.
    pub fn new_default(uri: impl Into<String>, data_directory: impl Into<PathBuf>) -> Self {
        Self {
            vector_store_uri: uri.into(),
            qdrant_api_key: None,
            collection: "documents".into(),
            space: VectorSpace {
                size: 1024,
                distance: DistanceKind::Cosine,
            },
            upsert_batch: 128,
            data_directory: data_directory.into(),
            file_types: parse_file_types(DEFAULT_FILE_TYPES),
            chunking: ChunkingConfig::default(),
        }
    }

    /// Loads the configuration from environment variables.
    ///
    /// Keys: `vector_store_uri`, `vector_store_api_key`, `vector_store_collection`,
    /// `embedding_dim`, `data_directory`, `file_types`, `chunk_size`, `chunk_overlap`.
    pub fn from_env() -> Result<Self, RagError> {
        let mut cfg = Self::new_default(
            opt_env("vector_store_uri").unwrap_or_else(|| "http://localhost:6334".into()),
            opt_env("data_directory").unwrap_or_else(|| "data".into()),
        );
        cfg.qdrant_api_key = opt_env("vector_store_api_key");
        if let Some(c) = opt_env("vector_store_collection") {
            cfg.collection = c;
        }
        if let Some(t) = opt_env("file_types") {
            cfg.file_types = parse_file_types(&t);
        }
        cfg.space.size = env_usize("embedding_dim", cfg.space.size)?;
        cfg.chunking.size = env_usize("chunk_size", cfg.chunking.size)?;
        cfg.chunking.overlap = env_usize("chunk_overlap", cfg.chunking.overlap)?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// `true` when the in-process vector index is selected.
    pub fn uses_memory_index(&self) -> bool {
        self.vector_store_uri.starts_with(MEMORY_URI)
    }

    /// Validates config values.
    pub fn validate(&self) -> Result<(), RagError> {
        if self.vector_store_uri.trim().is_empty() {
            return Err(RagError::Config("vector_store_uri is empty".into()));
        }
        if self.collection.trim().is_empty() {
            return Err(RagError::Config("collection is empty".into()));
        }
        if self.space.size == 0 {
            return Err(RagError::Config("embedding_dim must be > 0".into()));
        }
        if self.upsert_batch == 0 {
            return Err(RagError::Config("upsert_batch must be > 0".into()));
        }
        if self.chunking.size == 0 || self.chunking.overlap >= self.chunking.size {
            return Err(RagError::Config(
                "chunk_size must be > 0 and greater than chunk_overlap".into(),
            ));
        }
        if self.file_types.is_empty() {
            return Err(RagError::Config("file_types is empty".into()));
        }
        Ok(())
    }
}

/// Splits a comma-separated extension list: trims, lowercases, strips a leading dot.
pub fn parse_file_types(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_usize(var: &str, default: usize) -> Result<usize, RagError> {
    match opt_env(var) {
        Some(v) => v
            .trim()
            .parse::<usize>()
            .map_err(|_| RagError::Config(format!("{var}: expected unsigned integer, got `{v}`"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_types_are_normalised() {
        assert_eq!(parse_file_types(" PDF, .md,,txt "), vec!["pdf", "md", "txt"]);
    }

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let mut cfg = RagConfig::new_default(MEMORY_URI, "data");
        assert!(cfg.validate().is_ok());
        cfg.chunking.overlap = cfg.chunking.size;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn memory_uri_is_detected() {
        assert!(RagConfig::new_default("memory://", "d").uses_memory_index());
        assert!(!RagConfig::new_default("http://localhost:6334", "d").uses_memory_index());
    }
}
