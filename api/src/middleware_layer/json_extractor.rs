use axum::{
    body::{Body, Bytes},
    http::{HeaderValue, Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::error_handler::ErrorBody;
use crate::middleware_layer::request_id::request_id_of;

async fn take_body(res: Response) -> (axum::http::response::Parts, Bytes) {
    let (parts, body) = res.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    (parts, bytes)
}

fn is_json(parts: &axum::http::response::Parts) -> bool {
    parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

fn code_for(msg: &str) -> &'static str {
    if msg.contains("missing field") {
        "BAD_REQUEST"
    } else if msg.contains("Content-Type") {
        "UNSUPPORTED_MEDIA_TYPE"
    } else {
        "INVALID_JSON"
    }
}

/// Re-shapes plain-text extractor rejections (400/415/422) into the
/// standard `{error, message}` body. JSON responses pass through untouched.
pub async fn json_error_mapper(req: Request<Body>, next: Next) -> Response {
    let request_id = request_id_of(req.headers()).to_string();
    let res = next.run(req).await;
    let status = res.status();

    if !(status == StatusCode::BAD_REQUEST
        || status == StatusCode::UNSUPPORTED_MEDIA_TYPE
        || status == StatusCode::UNPROCESSABLE_ENTITY)
    {
        return res;
    }

    let (mut parts, bytes) = take_body(res).await;
    if is_json(&parts) {
        return Response::from_parts(parts, bytes.into());
    }

    let original = String::from_utf8_lossy(&bytes);
    debug!(request_id = %request_id, status = %status, "request body rejected");

    let envelope = ErrorBody {
        error: code_for(&original),
        message: original.trim().to_string(),
    };

    let body = match serde_json::to_vec(&envelope) {
        Ok(v) => v,
        Err(_) => bytes.to_vec(),
    };

    parts.headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    parts.headers.remove(header::CONTENT_LENGTH);

    Response::from_parts(parts, body.into())
}
