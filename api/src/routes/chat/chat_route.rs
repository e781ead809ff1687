//! POST /chat — one document-grounded chat turn.

use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap};
use contextor::handle_chat;
use conversation::InteractionResult;
use tracing::{debug, error};

use crate::{
    core::app_state::AppState,
    error_handler::AppResult,
    middleware_layer::request_id::request_id_of,
    routes::chat::chat_request::ChatRequest,
};

/// Handler: POST /chat
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:5000/chat \
///   -H 'content-type: application/json' \
///   -d '{"prompt":"What is X?","history":[],"docs":[]}'
/// ```
pub async fn chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<ChatRequest>,
) -> AppResult<Json<InteractionResult>> {
    let request_id = request_id_of(&headers);
    debug!(
        request_id = %request_id,
        history = body.history.len(),
        docs = body.docs.len(),
        "chat: start"
    );

    let result = handle_chat(
        state.backend.as_ref(),
        &body.prompt,
        body.history,
        body.docs,
        state.rewrite_enabled,
    )
    .await
    .inspect_err(|e| error!(request_id = %request_id, error = %e, "chat: failed"))?;

    debug!(
        request_id = %request_id,
        documents = result.documents.len(),
        rewritten = result.rewritten,
        "chat: success"
    );
    Ok(Json(result))
}
