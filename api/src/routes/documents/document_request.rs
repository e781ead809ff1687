use serde::{Deserialize, Serialize};

/// Body shared by the single-document routes.
#[derive(Debug, Deserialize)]
pub struct FilenameRequest {
    pub filename: String,
}

/// Response payload for /add_document.
#[derive(Debug, Serialize)]
pub struct AddDocumentResponse {
    pub filename: String,
}

/// Response payload for /delete.
#[derive(Debug, Serialize)]
pub struct DeleteDocumentResponse {
    /// Vector index entries removed.
    pub count: u64,
}
