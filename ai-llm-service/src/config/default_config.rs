//! Default LLM configs loaded from environment variables.
//!
//! Convenience constructors for [`LlmModelConfig`], grouped by role:
//!
//! - **Local generation** → raw completion model driven by the Local backend
//! - **Chat**            → chat model driven by the Cloud backend (OpenAI or Ollama)
//! - **Embedding**       → embedding generator for the vector index
//!
//! # Environment variables
//!
//! Common:
//! - `llm_max_tokens`   = optional max tokens (u32)
//! - `llm_temperature`  = optional sampling temperature (0.0..=2.0, default 0.2)
//! - `llm_timeout_secs` = optional request timeout (default 600)
//!
//! Ollama:
//! - `ollama_url` or `ollama_port` = endpoint (default `http://localhost:11434`)
//! - `ollama_model`                = chat model (default `llama3`)
//! - `local_llm_model`             = raw generation model (default: `ollama_model`)
//!
//! OpenAI:
//! - `OPENAI_API_KEY` (required when OpenAI is used)
//! - `openai_model`    (default `gpt-4o-mini`)
//! - `openai_endpoint` (default `https://api.openai.com`)
//!
//! Embeddings:
//! - `embedding_provider` = `ollama` | `openai` (default `ollama`)
//! - `embedding_model`    = model name (default depends on provider)

use crate::{
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, ConfigError, env_opt_f32, env_opt_u32, env_opt_u64, must_env, opt_env,
        validate_http_endpoint, validate_range_f32,
    },
};

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

/// Resolves the Ollama endpoint from environment.
///
/// Precedence:
/// 1. `ollama_url` if present and non-empty
/// 2. `ollama_port` → `http://localhost:{port}`
/// 3. `http://localhost:11434`
///
/// # Errors
/// - [`ConfigError::InvalidNumber`] if `ollama_port` is invalid
/// - [`ConfigError::InvalidFormat`] if `ollama_url` has no http(s) scheme
fn ollama_endpoint() -> Result<String, AiLlmError> {
    if let Some(url) = opt_env("ollama_url") {
        validate_http_endpoint("ollama_url", &url)?;
        return Ok(url);
    }
    if let Some(port) = opt_env("ollama_port") {
        let _ = port
            .trim()
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidNumber {
                var: "ollama_port",
                reason: "expected u16 (1..=65535)",
            })?;
        return Ok(format!("http://localhost:{}", port.trim()));
    }
    Ok(DEFAULT_OLLAMA_URL.to_string())
}

/// Shared sampling knobs: `(max_tokens, temperature, timeout_secs)`.
fn sampling_knobs() -> Result<(Option<u32>, Option<f32>, Option<u64>), AiLlmError> {
    let max_tokens = env_opt_u32("llm_max_tokens")?;
    let temperature = env_opt_f32("llm_temperature")?.unwrap_or(0.2);
    validate_range_f32("llm_temperature", temperature, 0.0, 2.0)?;
    let timeout = env_opt_u64("llm_timeout_secs")?.unwrap_or(600);
    Ok((max_tokens, Some(temperature), Some(timeout)))
}

/// Constructs a config for the Local backend's raw generation model (Ollama).
///
/// # Env
/// - `local_llm_model` or `ollama_model` (default `llama3`)
pub fn config_local_generation() -> Result<LlmModelConfig, AiLlmError> {
    let endpoint = ollama_endpoint()?;
    let model = opt_env("local_llm_model")
        .or_else(|| opt_env("ollama_model"))
        .unwrap_or_else(|| "llama3".to_string());
    let (max_tokens, temperature, timeout_secs) = sampling_knobs()?;

    Ok(LlmModelConfig {
        provider: LlmProvider::Ollama,
        model,
        endpoint,
        api_key: None,
        max_tokens,
        temperature,
        top_p: None,
        timeout_secs,
    })
}

/// Constructs a chat config for the given provider.
///
/// # Errors
/// - [`ConfigError::MissingVar`] when OpenAI is selected without `OPENAI_API_KEY`
pub fn config_chat(provider: LlmProvider) -> Result<LlmModelConfig, AiLlmError> {
    let (max_tokens, temperature, timeout_secs) = sampling_knobs()?;

    let cfg = match provider {
        LlmProvider::Ollama => LlmModelConfig {
            provider,
            model: opt_env("ollama_model").unwrap_or_else(|| "llama3".to_string()),
            endpoint: ollama_endpoint()?,
            api_key: None,
            max_tokens,
            temperature,
            top_p: None,
            timeout_secs,
        },
        LlmProvider::OpenAI => {
            let endpoint =
                opt_env("openai_endpoint").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string());
            validate_http_endpoint("openai_endpoint", &endpoint)?;
            LlmModelConfig {
                provider,
                model: opt_env("openai_model").unwrap_or_else(|| "gpt-4o-mini".to_string()),
                endpoint,
                api_key: Some(must_env("OPENAI_API_KEY")?),
                max_tokens,
                temperature,
                top_p: None,
                timeout_secs,
            }
        }
    };

    if cfg.model.trim().is_empty() {
        return Err(ConfigError::EmptyModel.into());
    }
    Ok(cfg)
}

/// Constructs a config for the **embedding** model.
///
/// # Env
/// - `embedding_provider` (`ollama` | `openai`, default `ollama`)
/// - `embedding_model` (default `bge-m3` for Ollama, `text-embedding-3-small` for OpenAI)
///
/// # Defaults
/// - `temperature = Some(0.0)` (deterministic)
/// - `timeout_secs = Some(30)`
pub fn config_embedding() -> Result<LlmModelConfig, AiLlmError> {
    let provider = match opt_env("embedding_provider") {
        Some(name) => {
            LlmProvider::parse(&name).ok_or(ConfigError::UnsupportedProvider(name))?
        }
        None => LlmProvider::Ollama,
    };

    let cfg = match provider {
        LlmProvider::Ollama => LlmModelConfig {
            provider,
            model: opt_env("embedding_model").unwrap_or_else(|| "bge-m3".to_string()),
            endpoint: ollama_endpoint()?,
            api_key: None,
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        },
        LlmProvider::OpenAI => LlmModelConfig {
            provider,
            model: opt_env("embedding_model")
                .unwrap_or_else(|| "text-embedding-3-small".to_string()),
            endpoint: opt_env("openai_endpoint").unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string()),
            api_key: Some(must_env("OPENAI_API_KEY")?),
            max_tokens: None,
            temperature: Some(0.0),
            top_p: None,
            timeout_secs: Some(30),
        },
    };
    Ok(cfg)
}
