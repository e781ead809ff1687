//! Lightweight Ollama service for text generation, chat and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`   — synchronous text generation (`stream=false`)
//! - `POST {endpoint}/api/chat`       — synchronous chat completion (`stream=false`)
//! - `POST {endpoint}/api/embeddings` — embeddings retrieval
//!
//! It uses the universal configuration [`LlmModelConfig`] and ensures
//! that the selected provider is [`LlmProvider::Ollama`].

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::{
    chat_message::ChatMessage,
    config::{llm_model_config::LlmModelConfig, llm_provider::LlmProvider},
    error_handler::{
        AiLlmError, HttpError, Provider, ProviderError, ProviderErrorKind, make_snippet,
    },
};

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout.
#[derive(Debug)]
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_chat: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - `InvalidProvider` if `cfg.provider` is not `Ollama`
    /// - `InvalidEndpoint` if `cfg.endpoint` is invalid
    /// - [`AiLlmError::HttpTransport`] if HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self, AiLlmError> {
        if cfg.provider != LlmProvider::Ollama {
            return Err(
                ProviderError::new(Provider::Ollama, ProviderErrorKind::InvalidProvider).into(),
            );
        }

        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::InvalidEndpoint(cfg.endpoint.clone()),
            )
            .into());
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(60));

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{}/api/generate", base);
        let url_chat = format!("{}/api/chat", base);
        let url_embeddings = format!("{}/api/embeddings", base);

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_chat,
            url_embeddings,
        })
    }

    /// Model identifier this client talks to.
    pub fn model(&self) -> &str {
        &self.cfg.model
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// With `raw = true` Ollama applies no prompt template, so the caller's
    /// prompt (including its role tokens) is fed to the model verbatim.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - `Decode` if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model, raw = raw))]
    pub async fn generate(&self, prompt: &str, raw: bool) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, raw);

        debug!(prompt_len = prompt.len(), "POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;
        let resp = self.check_status(resp, &self.url_generate, started).await?;

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; ensure `stream=false` is used"
                )),
            )
        })?;

        debug!(latency_ms = started.elapsed().as_millis(), "generate completed");
        Ok(out.response)
    }

    /// Performs a **non-streaming** chat request via `/api/chat`.
    ///
    /// # Errors
    /// Same as [`OllamaService::generate`]; additionally `EmptyChoices` when
    /// the response carries no message.
    #[instrument(skip_all, fields(model = %self.cfg.model, messages = messages.len()))]
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String, AiLlmError> {
        let started = Instant::now();
        let body = ChatRequest {
            model: &self.cfg.model,
            messages,
            stream: false,
            options: Some(GenerateOptions::from_cfg(&self.cfg)),
        };

        debug!("POST {}", self.url_chat);
        let resp = self.client.post(&self.url_chat).json(&body).send().await?;
        let resp = self.check_status(resp, &self.url_chat, started).await?;

        let out: ChatResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!("serde error: {e}; expected `message.content`")),
            )
        })?;

        match out.message {
            Some(m) => Ok(m.content),
            None => Err(ProviderError::new(Provider::Ollama, ProviderErrorKind::EmptyChoices).into()),
        }
    }

    /// Retrieves embeddings via `/api/embeddings`.
    ///
    /// # Errors
    /// - `HttpStatus` for non-2xx responses
    /// - [`AiLlmError::HttpTransport`] for client errors
    /// - `Decode` if response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>, AiLlmError> {
        let started = Instant::now();
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            prompt: input,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;
        let resp = self.check_status(resp, &self.url_embeddings, started).await?;

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            ProviderError::new(
                Provider::Ollama,
                ProviderErrorKind::Decode(format!(
                    "serde error: {e}; expected `{{ embedding: number[] }}`"
                )),
            )
        })?;

        Ok(out.embedding)
    }

    async fn check_status(
        &self,
        resp: reqwest::Response,
        url: &str,
        started: Instant,
    ) -> Result<reqwest::Response, AiLlmError> {
        if resp.status().is_success() {
            return Ok(resp);
        }
        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        let snippet = make_snippet(&text);

        error!(
            %status,
            %url,
            %snippet,
            model = %self.cfg.model,
            latency_ms = started.elapsed().as_millis(),
            "Ollama returned non-success status"
        );

        Err(ProviderError::new(
            Provider::Ollama,
            ProviderErrorKind::HttpStatus(HttpError {
                status,
                url: url.to_string(),
                snippet,
            }),
        )
        .into())
    }
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate` (non-streaming).
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    raw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, raw: bool) -> Self {
        Self {
            model: &cfg.model,
            prompt,
            stream: false,
            raw,
            options: Some(GenerateOptions::from_cfg(cfg)),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

impl GenerateOptions {
    fn from_cfg(cfg: &LlmModelConfig) -> Self {
        Self {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        }
    }
}

/// Response body for `/api/generate`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Request body for `/api/chat`.
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

/// Response body for `/api/chat`.
#[derive(Debug, Deserialize)]
struct ChatResponse {
    message: Option<ChatResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(provider: LlmProvider, endpoint: &str) -> LlmModelConfig {
        LlmModelConfig {
            provider,
            model: "llama3".into(),
            endpoint: endpoint.into(),
            api_key: None,
            max_tokens: Some(64),
            temperature: Some(0.1),
            top_p: None,
            timeout_secs: Some(5),
        }
    }

    #[test]
    fn rejects_foreign_provider() {
        let err = OllamaService::new(cfg(LlmProvider::OpenAI, "http://localhost:11434"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid provider"));
    }

    #[test]
    fn rejects_endpoint_without_scheme() {
        assert!(OllamaService::new(cfg(LlmProvider::Ollama, "localhost:11434")).is_err());
    }

    #[test]
    fn raw_generate_request_shape() {
        let c = cfg(LlmProvider::Ollama, "http://localhost:11434");
        let body = serde_json::to_value(GenerateRequest::from_cfg(&c, "<|user|>hi", true)).unwrap();
        assert_eq!(body["raw"], true);
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_predict"], 64);
    }
}
