use std::sync::Arc;

use axum::{Json, extract::State};

use crate::{core::app_state::AppState, error_handler::AppResult};

/// Handler: GET /get_documents
pub async fn get_documents(State(state): State<Arc<AppState>>) -> AppResult<Json<Vec<String>>> {
    Ok(Json(state.documents.list_documents().await?))
}
