use std::path::Path;
use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, header},
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::{
    core::app_state::AppState,
    error_handler::{AppError, AppResult},
    middleware_layer::request_id::request_id_of,
    routes::documents::document_request::FilenameRequest,
};

/// `attachment; filename="<name>"` with quotes and control characters replaced.
fn content_disposition(filename: &str) -> HeaderValue {
    let base = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("document");
    let safe: String = base
        .chars()
        .map(|c| if c == '"' || c == '\\' || !c.is_ascii() || c.is_ascii_control() { '_' } else { c })
        .collect();
    HeaderValue::from_str(&format!("attachment; filename=\"{safe}\""))
        .unwrap_or(HeaderValue::from_static("attachment"))
}

/// Handler: POST /get_document
///
/// Streams the raw file back as a download.
pub async fn get_document(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<FilenameRequest>,
) -> AppResult<Response> {
    let bytes = state
        .documents
        .read_document(&body.filename)
        .await
        .map_err(AppError::from)?;
    debug!(
        request_id = %request_id_of(&headers),
        filename = %body.filename,
        bytes = bytes.len(),
        "get_document: sending"
    );

    Ok((
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            ),
            (header::CONTENT_DISPOSITION, content_disposition(&body.filename)),
        ],
        bytes,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_uses_base_name_and_strips_quotes() {
        assert_eq!(
            content_disposition("sub/re\"port.pdf"),
            "attachment; filename=\"re_port.pdf\""
        );
        assert_eq!(content_disposition("a.txt"), "attachment; filename=\"a.txt\"");
    }
}
