//! Shared LLM service with Ollama and OpenAI providers.
//!
//! - [`services::ollama_service::OllamaService`]: `/api/generate`, `/api/chat`, `/api/embeddings`
//! - [`services::open_ai_service::OpenAiService`]: `/v1/chat/completions`, `/v1/embeddings`
//! - [`config::default_config`]: env-driven constructors for generation, chat and embedding profiles
//! - [`error_handler`]: unified error type and env helpers
//! - [`telemetry`]: log formatting shared by the workspace

pub mod chat_message;
pub mod config;
pub mod error_handler;
pub mod services;
pub mod telemetry;

pub use chat_message::{ChatMessage, ChatRole};
pub use config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider};
pub use error_handler::AiLlmError;
