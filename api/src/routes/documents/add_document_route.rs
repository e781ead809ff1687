use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use tracing::{error, info};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    middleware_layer::request_id::request_id_of,
    routes::documents::document_request::{AddDocumentResponse, FilenameRequest},
};

/// Handler: POST /add_document
///
/// Ingests a file that already sits in the document directory.
pub async fn add_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<FilenameRequest>,
) -> AppResult<Json<AddDocumentResponse>> {
    let request_id = request_id_of(&headers);

    state
        .backend
        .add_document(&body.filename)
        .await
        .inspect_err(|e| {
            error!(request_id = %request_id, filename = %body.filename, error = %e, "add_document: failed")
        })?;

    info!(request_id = %request_id, filename = %body.filename, "add_document: indexed");
    Ok(Json(AddDocumentResponse {
        filename: body.filename,
    }))
}
