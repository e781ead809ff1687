//! Flat document directory: listing, reading and removing files.
//!
//! Documents are addressed by their file name relative to the configured root.
//! The canonical `source` stored in the indexes is `root.join(name)` rendered
//! as a string, so every index entry can be traced back to a file.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::errors::RagError;

/// Handle on the document directory.
#[derive(Clone, Debug)]
pub struct DocumentStore {
    root: PathBuf,
    file_types: Vec<String>,
}

impl DocumentStore {
    pub fn new(root: impl Into<PathBuf>, file_types: Vec<String>) -> Self {
        Self {
            root: root.into(),
            file_types,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves a caller-supplied name to its path under the root.
    ///
    /// Only plain relative names are accepted; absolute paths and `..`
    /// segments are rejected.
    pub fn resolve(&self, name: &str) -> Result<PathBuf, RagError> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(RagError::InvalidName("empty file name".into()));
        }
        let rel = Path::new(trimmed);
        let plain = rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !plain {
            return Err(RagError::InvalidName(trimmed.to_string()));
        }
        Ok(self.root.join(rel))
    }

    /// Canonical `source` identifier for a document name.
    pub fn source_of(&self, name: &str) -> Result<String, RagError> {
        Ok(self.resolve(name)?.to_string_lossy().into_owned())
    }

    /// `true` if the extension of `name` is in the allow-list.
    pub fn is_allowed(&self, name: &str) -> bool {
        Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| self.file_types.iter().any(|t| t.eq_ignore_ascii_case(e)))
            .unwrap_or(false)
    }

    /// Lists regular files directly under the root whose extension is allowed.
    ///
    /// A missing root yields an empty list. Result is sorted by name.
    pub async fn list(&self) -> Result<Vec<String>, RagError> {
        let mut rd = match tokio::fs::read_dir(&self.root).await {
            Ok(rd) => rd,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(root = %self.root.display(), "document directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut out = Vec::new();
        while let Some(entry) = rd.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if self.is_allowed(&name) {
                out.push(name);
            }
        }
        out.sort();
        debug!(count = out.len(), "listed documents");
        Ok(out)
    }

    /// Reads raw bytes of a document.
    pub async fn read_bytes(&self, name: &str) -> Result<Vec<u8>, RagError> {
        let path = self.resolve(name)?;
        match tokio::fs::read(&path).await {
            Ok(b) => Ok(b),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(RagError::NotFound(name.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    /// Reads a document as text (invalid UTF-8 sequences are replaced).
    pub async fn read_text(&self, name: &str) -> Result<String, RagError> {
        let bytes = self.read_bytes(name).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Removes a document file. Returns `false` if it was already absent.
    pub async fn remove(&self, name: &str) -> Result<bool, std::io::Error> {
        let path = self
            .resolve(name)
            .map_err(|e| std::io::Error::new(ErrorKind::InvalidInput, e.to_string()))?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Loads every listed document as `(name, text)`.
    ///
    /// Unreadable files are skipped with a warning so one bad file does not
    /// block a keyword index rebuild.
    pub async fn load_all(&self) -> Result<Vec<(String, String)>, RagError> {
        let mut out = Vec::new();
        for name in self.list().await? {
            match self.read_text(&name).await {
                Ok(text) => out.push((name, text)),
                Err(e) => warn!(%name, error = %e, "skipping unreadable document"),
            }
        }
        Ok(out)
    }
}
