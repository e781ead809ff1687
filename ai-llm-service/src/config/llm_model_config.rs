use crate::config::llm_provider::LlmProvider;

/// Configuration for an LLM model invocation.
///
/// This struct contains both general and provider-specific parameters.
///
/// # Fields
///
/// - `provider`: Which LLM provider/backend to use (Ollama or OpenAI).
/// - `model`: The model identifier (e.g., `"gpt-4o-mini"`, `"llama3"`).
/// - `endpoint`: The inference endpoint base (local server or remote API URL).
/// - `api_key`: Optional API key for providers that require authentication.
/// - `max_tokens`: Maximum number of tokens to generate (if supported).
/// - `temperature`: Controls randomness (0.0 = deterministic).
/// - `top_p`: Nucleus sampling cutoff.
/// - `timeout_secs`: Optional request timeout in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmModelConfig {
    /// The LLM provider/backend.
    pub provider: LlmProvider,

    /// Model identifier string.
    pub model: String,

    /// Inference endpoint base URL.
    pub endpoint: String,

    /// Optional API key for authentication (e.g., OpenAI).
    pub api_key: Option<String>,

    /// Maximum number of tokens to generate.
    pub max_tokens: Option<u32>,

    /// Sampling temperature.
    pub temperature: Option<f32>,

    /// Nucleus sampling parameter.
    pub top_p: Option<f32>,

    /// Optional request timeout (in seconds).
    pub timeout_secs: Option<u64>,
}
