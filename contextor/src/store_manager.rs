//! Document Store Manager.
//!
//! Deletion is a fixed sequence:
//! 1. resolve the name to its canonical `source`
//! 2. remove every vector entry with that `source` inside a load/release scope
//! 3. remove the file
//! 4. ask the backend to rebuild its keyword index
//!
//! The load in step 2 is paired with a release even when the caller drops
//! the future mid-delete; see [`CollectionLease`].
//!
//! Index removal precedes file removal. If step 2 fails nothing has changed.
//! If step 3 fails the index no longer references a file that still exists,
//! which is reported as [`ContextorError::PartialDelete`]. Step 4 failures
//! are logged and do not fail the call.

use std::sync::Arc;

use rag_store::{DocumentStore, RagError, VectorIndex};
use tracing::{error, info, warn};

use crate::backend::ChatBackend;
use crate::error::ContextorError;

pub struct DocumentStoreManager {
    documents: DocumentStore,
    index: Arc<dyn VectorIndex>,
    backend: Arc<dyn ChatBackend>,
}

impl DocumentStoreManager {
    pub fn new(
        documents: DocumentStore,
        index: Arc<dyn VectorIndex>,
        backend: Arc<dyn ChatBackend>,
    ) -> Self {
        Self {
            documents,
            index,
            backend,
        }
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Allowed documents in the document directory, sorted by name.
    pub async fn list_documents(&self) -> Result<Vec<String>, ContextorError> {
        Ok(self.documents.list().await?)
    }

    /// Raw bytes of a document.
    pub async fn read_document(&self, filename: &str) -> Result<Vec<u8>, ContextorError> {
        Ok(self.documents.read_bytes(filename).await?)
    }

    /// Removes a document from the vector index, storage and keyword index.
    /// Returns the number of vector entries removed.
    ///
    /// Deleting a document that exists nowhere returns `0`.
    pub async fn delete_document(&self, filename: &str) -> Result<u64, ContextorError> {
        let source = self.documents.source_of(filename)?;

        let removed = remove_from_index(&self.index, &source).await?;

        match self.documents.remove(filename).await {
            Ok(true) => {}
            Ok(false) => warn!(%source, "file already absent from storage"),
            Err(cause) => {
                error!(%source, removed, error = %cause, "index entries removed but file removal failed");
                return Err(ContextorError::PartialDelete {
                    source_path: source,
                    removed,
                    cause,
                });
            }
        }

        if let Err(e) = self.backend.reload().await {
            error!(%source, error = %e, "keyword index reload failed after delete");
        }

        info!(%source, removed, "document deleted");
        Ok(removed)
    }
}

/// Deletes all entries for `source` with the collection held only for the
/// duration of the call. The collection is released on every path once it
/// was loaded, including when the delete fails or the future is dropped.
pub async fn remove_from_index(index: &Arc<dyn VectorIndex>, source: &str) -> Result<u64, RagError> {
    let lease = CollectionLease::acquire(index.clone()).await?;
    if !lease.loaded {
        // Nothing was ever indexed.
        lease.release().await?;
        return Ok(0);
    }

    let outcome = index.delete_by_source(source).await;
    let released = lease.release().await;

    let removed = outcome?;
    if let Err(e) = released {
        warn!(%source, error = %e, "collection release failed after delete");
    }
    Ok(removed)
}

/// One load of the vector collection, paired with exactly one release.
///
/// [`CollectionLease::release`] is the normal exit. A lease dropped before
/// that (cancelled request, panic) hands the release to the runtime.
struct CollectionLease {
    index: Arc<dyn VectorIndex>,
    loaded: bool,
    released: bool,
}

impl CollectionLease {
    async fn acquire(index: Arc<dyn VectorIndex>) -> Result<Self, RagError> {
        let loaded = index.load_collection().await?;
        Ok(Self {
            index,
            loaded,
            released: false,
        })
    }

    async fn release(mut self) -> Result<(), RagError> {
        let out = self.index.release_collection().await;
        self.released = true;
        out
    }
}

impl Drop for CollectionLease {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let index = self.index.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!("collection lease dropped before release; releasing in background");
                handle.spawn(async move {
                    if let Err(e) = index.release_collection().await {
                        warn!(error = %e, "background collection release failed");
                    }
                });
            }
            Err(_) => error!("collection lease dropped outside a runtime; collection stays loaded"),
        }
    }
}
