use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::{error, info};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    middleware_layer::request_id::request_id_of,
    routes::documents::document_request::{DeleteDocumentResponse, FilenameRequest},
};

/// Handler: POST /delete
///
/// Removes the document from the vector index, then from storage.
pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<FilenameRequest>,
) -> AppResult<Json<DeleteDocumentResponse>> {
    let request_id = request_id_of(&headers);

    let count = state
        .documents
        .delete_document(&body.filename)
        .await
        .inspect_err(|e| {
            error!(request_id = %request_id, filename = %body.filename, error = %e, "delete: failed")
        })?;

    info!(request_id = %request_id, filename = %body.filename, count, "delete: done");
    Ok(Json(DeleteDocumentResponse { count }))
}
