//! HTTP gateway for document-grounded chat.

use std::env;
use std::sync::Arc;

mod core;
pub mod error_handler;
mod middleware_layer;
mod routes;

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tokio::signal;
use tracing::{error, info};

pub use crate::core::app_state::AppState;
pub use crate::error_handler::{AppError, AppResult};

use crate::middleware_layer::{json_extractor::json_error_mapper, request_id::ensure_request_id};
use crate::routes::{
    chat::chat_route::chat,
    documents::{
        add_document_route::add_document, delete_document_route::delete_document,
        get_document_route::get_document, list_documents_route::get_documents,
    },
    health_route::health,
};

const DEFAULT_ADDRESS: &str = "0.0.0.0:5000";

/// All routes with their middleware, bound to `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/add_document", post(add_document))
        .route("/chat", post(chat))
        .route("/get_documents", get(get_documents))
        .route("/get_document", post(get_document))
        .route("/delete", post(delete_document))
        .route("/health", get(health))
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn(ensure_request_id))
        .with_state(state)
}

/// Binds `API_ADDRESS` (default `0.0.0.0:5000`) and serves until Ctrl+C.
pub async fn start(state: Arc<AppState>) -> Result<(), AppError> {
    let addr = env::var("API_ADDRESS").unwrap_or_else(|_| DEFAULT_ADDRESS.to_string());

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|source| AppError::Bind {
            addr: addr.clone(),
            source,
        })?;
    info!(%addr, "api listening");

    // Start server with graceful shutdown on Ctrl+C
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("api stopped");
    Ok(())
}

/// Returns a future that resolves when Ctrl+C is pressed
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        // Without a signal handler the server runs until killed.
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ai_llm_service::{AiLlmError, ChatMessage};
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use contextor::{BackendKind, Contextor, ContextorConfig, LanguageModel, RetrievalSettings, RewriteSettings};
    use contextor::prompt::PromptTokens;
    use futures::future::BoxFuture;
    use rag_store::{HashEmbedder, MEMORY_URI, RagConfig};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    /// Chat model that always answers the same text.
    struct FixedModel(&'static str);

    impl LanguageModel for FixedModel {
        fn name(&self) -> &str {
            "fixed"
        }

        fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
            Box::pin(async move { Ok(self.0.to_string()) })
        }

        fn chat<'a>(&'a self, _messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, AiLlmError>> {
            Box::pin(async move { Ok(self.0.to_string()) })
        }
    }

    async fn app(dir: &std::path::Path) -> Router {
        let mut rag = RagConfig::new_default(MEMORY_URI, dir);
        rag.space.size = 32;
        let cfg = ContextorConfig {
            backend: BackendKind::Local,
            rewrite: RewriteSettings {
                enabled: false,
                max_attempts: 1,
            },
            retrieval: RetrievalSettings::default(),
            tokens: PromptTokens::default(),
            rag,
        };
        let ctx = Contextor::with_parts(
            cfg,
            Arc::new(HashEmbedder::new(32)),
            Arc::new(FixedModel("The answer is 42.")),
        )
        .await
        .unwrap();
        router(Arc::new(AppState::new(&ctx)))
    }

    fn post(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(res: axum::response::Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn document_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "The answer to X is 42.").unwrap();
        std::fs::write(dir.path().join("skip.bin"), "binary").unwrap();
        let app = app(dir.path()).await;

        let res = app
            .clone()
            .oneshot(post("/add_document", json!({"filename": "x.txt"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(json_body(res).await, json!({"filename": "x.txt"}));

        let res = app.clone().oneshot(get("/get_documents")).await.unwrap();
        assert_eq!(json_body(res).await, json!(["x.txt"]));

        let res = app
            .clone()
            .oneshot(post("/get_document", json!({"filename": "x.txt"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "application/octet-stream");
        assert_eq!(
            res.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"x.txt\""
        );
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"The answer to X is 42.");

        let res = app
            .clone()
            .oneshot(post("/delete", json!({"filename": "x.txt"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert!(json_body(res).await["count"].as_u64().unwrap() >= 1);

        let res = app.clone().oneshot(get("/get_documents")).await.unwrap();
        assert_eq!(json_body(res).await, json!([]));

        let res = app
            .oneshot(post("/delete", json!({"filename": "x.txt"})))
            .await
            .unwrap();
        assert_eq!(json_body(res).await, json!({"count": 0}));
    }

    #[tokio::test]
    async fn chat_returns_canonical_result() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.txt"), "The answer to X is 42.").unwrap();
        let app = app(dir.path()).await;
        app.clone()
            .oneshot(post("/add_document", json!({"filename": "x.txt"})))
            .await
            .unwrap();

        let res = app
            .oneshot(post("/chat", json!({"prompt": "What is X?"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let body = json_body(res).await;

        assert_eq!(body["reply"], "The answer is 42.");
        assert_eq!(body["rewritten"], false);
        assert_eq!(body["question"], "What is X?");
        assert_eq!(
            body["history"],
            json!([
                {"role": "user", "content": "What is X?"},
                {"role": "assistant", "content": "The answer is 42."}
            ])
        );
        let first = &body["documents"][0];
        assert!(first["s"].as_str().unwrap().ends_with("x.txt"));
        assert_eq!(first["c"], "The answer to X is 42.");
        assert!(first["pk"].is_string());
        assert!(first["provenance"].is_number());
    }

    #[tokio::test]
    async fn missing_document_is_404() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let res = app
            .oneshot(post("/get_document", json!({"filename": "nope.txt"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(res).await["error"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn path_escape_is_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let res = app
            .oneshot(post("/delete", json!({"filename": "../secret.txt"})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(res).await["error"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn malformed_body_gets_error_shape_and_request_id() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let res = app
            .oneshot(post("/chat", json!({"history": []})))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(res.headers().contains_key("X-Request-Id"));
        let body = json_body(res).await;
        assert_eq!(body["error"], "BAD_REQUEST");
        assert!(body["message"].as_str().unwrap().contains("prompt"));
    }

    #[tokio::test]
    async fn request_id_is_propagated() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(dir.path()).await;

        let req = Request::builder()
            .uri("/health")
            .header("X-Request-Id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.headers()["X-Request-Id"], "abc-123");
        assert_eq!(json_body(res).await["status"], "ok");
    }
}
