//! Unified error handling for `ai-llm-service`.
//!
//! This module exposes a single top-level error type [`AiLlmError`] for the whole
//! library, and groups domain-specific errors in nested types (e.g., [`ConfigError`],
//! [`ProviderError`]). Small helpers for reading/validating environment variables are
//! provided and return the unified [`Result<T>`] alias.
//!
//! All messages include the suffix `[AI LLM Service]` to simplify attribution in logs.

use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/* ------------------------------------------------------------------------- */
/* Public result alias                                                       */
/* ------------------------------------------------------------------------- */

/// Unified result alias for the entire crate.
pub type Result<T> = std::result::Result<T, AiLlmError>;

/* ------------------------------------------------------------------------- */
/* Top-level error                                                           */
/* ------------------------------------------------------------------------- */

/// Top-level error for the `ai-llm-service` crate.
///
/// Variants wrap domain-specific types (config/provider) and a few common cases
/// (HTTP transport, timeouts).
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AiLlmError {
    /// Configuration/validation errors (startup/readiness).
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Upstream provider misbehaved (status, decode, empty output).
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// Underlying HTTP transport error (e.g., `reqwest::Error`).
    #[error("[AI LLM Service] transport error: {0}")]
    HttpTransport(#[from] reqwest::Error),

    /// Operation exceeded the configured timeout.
    #[error("[AI LLM Service] operation timed out after {0:?}")]
    Timeout(Duration),
}

/* ------------------------------------------------------------------------- */
/* Config errors                                                             */
/* ------------------------------------------------------------------------- */

/// Error enum for environment/config-driven setup.
///
/// Keep this focused: only errors that realistically happen at config
/// load/validation time.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable is missing or empty.
    #[error("[AI LLM Service] missing required environment variable: {0}")]
    MissingVar(&'static str),

    /// A number failed to parse (like ports, limits, timeouts).
    #[error("[AI LLM Service] invalid number in {var}: {reason}")]
    InvalidNumber {
        /// Variable name (e.g., `llm_max_tokens`).
        var: &'static str,
        /// Human-readable reason (e.g., `expected u32`).
        reason: &'static str,
    },

    /// Unsupported provider name.
    #[error("[AI LLM Service] unsupported provider: {0}")]
    UnsupportedProvider(String),

    /// Value had the wrong format (e.g., invalid URL).
    #[error("[AI LLM Service] invalid format in {var}: {reason}")]
    InvalidFormat {
        /// Variable name (e.g., `ollama_url`).
        var: &'static str,
        /// Explanation (e.g., `must start with http:// or https://`).
        reason: &'static str,
    },

    /// A numeric field was outside of the allowed range.
    #[error("[AI LLM Service] {field} is out of range: {detail}")]
    OutOfRange {
        /// Field name (e.g., `temperature`).
        field: &'static str,
        /// Description of the expected range.
        detail: &'static str,
    },

    /// Model name was empty or invalid.
    #[error("[AI LLM Service] model name must not be empty")]
    EmptyModel,
}

/* ------------------------------------------------------------------------- */
/* Provider errors                                                           */
/* ------------------------------------------------------------------------- */

/// Which upstream produced a [`ProviderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Ollama,
    OpenAI,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Ollama => f.write_str("Ollama"),
            Provider::OpenAI => f.write_str("OpenAI"),
        }
    }
}

/// Non-2xx HTTP answer from an upstream.
#[derive(Debug, Clone)]
pub struct HttpError {
    /// Numeric HTTP status code.
    pub status: StatusCode,
    /// Request URL.
    pub url: String,
    /// Short snippet of the response body (trimmed).
    pub snippet: String,
}

/// What exactly went wrong with a provider.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub enum ProviderErrorKind {
    /// The config targets a different provider than the client.
    InvalidProvider,
    /// API key is required but absent.
    MissingApiKey,
    /// The endpoint is empty or does not start with http/https.
    InvalidEndpoint(String),
    /// Upstream returned a non-successful HTTP status.
    HttpStatus(HttpError),
    /// Response payload could not be decoded as expected.
    Decode(String),
    /// Completion response carried no choices/content.
    EmptyChoices,
}

/// Provider-scoped failure.
#[derive(Debug, Error)]
#[error("[AI LLM Service] {provider}: {kind}")]
pub struct ProviderError {
    pub provider: Provider,
    pub kind: ProviderErrorKind,
}

impl ProviderError {
    pub fn new(provider: Provider, kind: ProviderErrorKind) -> Self {
        Self { provider, kind }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderErrorKind::InvalidProvider => f.write_str("invalid provider for this client"),
            ProviderErrorKind::MissingApiKey => f.write_str("missing API key"),
            ProviderErrorKind::InvalidEndpoint(e) => write!(f, "invalid endpoint: {e}"),
            ProviderErrorKind::HttpStatus(h) => {
                write!(f, "HTTP {} from {}: {}", h.status, h.url, h.snippet)
            }
            ProviderErrorKind::Decode(m) => write!(f, "decode error: {m}"),
            ProviderErrorKind::EmptyChoices => f.write_str("response contained no choices"),
        }
    }
}

/// Trims an upstream body to a log-friendly snippet (240 chars max).
pub fn make_snippet(text: &str) -> String {
    text.chars().take(240).collect::<String>().trim().to_string()
}

/* ------------------------------------------------------------------------- */
/* Env helpers (return unified `Result<T>`)                                  */
/* ------------------------------------------------------------------------- */

/// Fetches a required, non-empty environment variable.
///
/// # Errors
/// Returns [`AiLlmError::Config`] with [`ConfigError::MissingVar`] if the
/// variable is absent or empty.
pub fn must_env(name: &'static str) -> Result<String> {
    match std::env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingVar(name).into()),
    }
}

/// Reads an optional, non-empty environment variable.
pub fn opt_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Parses an optional `u32` from env (`Ok(None)` if unset/empty).
///
/// # Errors
/// Returns [`ConfigError::InvalidNumber`] if the variable is set but not a valid `u32`.
pub fn env_opt_u32(name: &'static str) -> Result<Option<u32>> {
    match opt_env(name) {
        Some(v) => v.trim().parse::<u32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u32",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `u64` from env (`Ok(None)` if unset/empty).
pub fn env_opt_u64(name: &'static str) -> Result<Option<u64>> {
    match opt_env(name) {
        Some(v) => v.trim().parse::<u64>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected u64",
            })
        }),
        None => Ok(None),
    }
}

/// Parses an optional `f32` from env (`Ok(None)` if unset/empty).
pub fn env_opt_f32(name: &'static str) -> Result<Option<f32>> {
    match opt_env(name) {
        Some(v) => v.trim().parse::<f32>().map(Some).map_err(|_| {
            AiLlmError::from(ConfigError::InvalidNumber {
                var: name,
                reason: "expected f32",
            })
        }),
        None => Ok(None),
    }
}

/// Reads a boolean flag. `True`, `true`, `1`, `yes` count as set; anything else
/// (including absence) is `false`.
pub fn env_flag(name: &str) -> bool {
    opt_env(name)
        .map(|v| matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

/* ------------------------------------------------------------------------- */
/* Validation helpers (return unified `Result<T>`)                           */
/* ------------------------------------------------------------------------- */

/// Validates that an HTTP endpoint starts with `http://` or `https://`.
///
/// # Errors
/// Returns [`ConfigError::InvalidFormat`] when the string does not start with
/// a valid HTTP scheme.
pub fn validate_http_endpoint(var: &'static str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::InvalidFormat {
            var,
            reason: "must start with http:// or https://",
        }
        .into())
    }
}

/// Validates that a floating-point value lies within an inclusive range.
///
/// # Errors
/// Returns [`ConfigError::OutOfRange`] if `value` is outside `[min, max]`.
pub fn validate_range_f32(field: &'static str, value: f32, min: f32, max: f32) -> Result<()> {
    if value.is_finite() && value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            detail: "expected value in inclusive range",
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_validation() {
        assert!(validate_http_endpoint("x", "http://localhost:11434").is_ok());
        assert!(validate_http_endpoint("x", "https://api.openai.com").is_ok());
        assert!(validate_http_endpoint("x", "localhost:11434").is_err());
    }

    #[test]
    fn range_validation_rejects_nan() {
        assert!(validate_range_f32("temperature", 0.5, 0.0, 2.0).is_ok());
        assert!(validate_range_f32("temperature", f32::NAN, 0.0, 2.0).is_err());
        assert!(validate_range_f32("temperature", 2.5, 0.0, 2.0).is_err());
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(1000);
        assert_eq!(make_snippet(&long).len(), 240);
    }

    #[test]
    fn provider_error_message_names_provider() {
        let e = ProviderError::new(Provider::OpenAI, ProviderErrorKind::EmptyChoices);
        assert!(e.to_string().contains("OpenAI"));
    }
}
