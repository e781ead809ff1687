use axum::{
    body::Body,
    http::{HeaderMap, HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

pub const REQUEST_ID_HEADER: &str = "X-Request-Id";

/// Request id carried in `headers`, or `-`.
pub fn request_id_of(headers: &HeaderMap) -> &str {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .filter(|v| !v.trim().is_empty())
        .unwrap_or("-")
}

fn generate() -> HeaderValue {
    let nanos = Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_else(|| Utc::now().timestamp_micros() * 1000);
    // Only ASCII digits and a prefix, always a valid header value.
    HeaderValue::from_str(&format!("req-{nanos}")).unwrap_or(HeaderValue::from_static("req-0"))
}

/// Propagates the caller's `X-Request-Id` or assigns one, on both the
/// request (for handlers) and the response.
pub async fn ensure_request_id(mut req: Request<Body>, next: Next) -> Response {
    let id = match req.headers().get(REQUEST_ID_HEADER) {
        Some(v) if !v.as_bytes().iter().all(u8::is_ascii_whitespace) => v.clone(),
        _ => generate(),
    };
    req.headers_mut().insert(REQUEST_ID_HEADER, id.clone());

    let mut res = next.run(req).await;
    res.headers_mut().insert(REQUEST_ID_HEADER, id);
    res
}
