use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use contextor::ContextorError;
use rag_store::RagError;
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- IO / network / server ---
    #[error("failed to bind listener on {addr}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("File not found: {0}")]
    NotFound(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            // 4xx
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,

            // custom mapped
            AppError::Http { status, .. } => *status,

            // 5xx
            AppError::Bind { .. } | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind { .. } => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Http { code, .. } => code,
        }
    }
}

/// Engine errors keep their kind and the offending identifier.
impl From<ContextorError> for AppError {
    fn from(err: ContextorError) -> Self {
        match err {
            ContextorError::NotFound { filename } => AppError::NotFound(filename),
            ContextorError::InvalidName(name) => {
                AppError::BadRequest(format!("invalid document name: {name}"))
            }
            e @ ContextorError::EngineFailure(_) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "ENGINE_FAILURE",
                message: e.to_string(),
            },
            e @ ContextorError::Conversation(_) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "MALFORMED_ENVELOPE",
                message: e.to_string(),
            },
            e @ ContextorError::PartialDelete { .. } => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "PARTIAL_DELETE_FAILURE",
                message: e.to_string(),
            },
            e @ ContextorError::Rag(RagError::Embedding(_)) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "EMBEDDING_ERROR",
                message: e.to_string(),
            },
            e @ ContextorError::Rag(RagError::Io(_)) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "STORAGE_IO_ERROR",
                message: e.to_string(),
            },
            e @ ContextorError::Rag(_) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "VECTOR_INDEX_ERROR",
                message: e.to_string(),
            },
            e @ (ContextorError::Config(_) | ContextorError::Llm(_)) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INTERNAL_ERROR",
                message: e.to_string(),
            },
        }
    }
}

#[derive(Serialize)]
pub(crate) struct ErrorBody<'a> {
    pub error: &'a str,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;
