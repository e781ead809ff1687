//! Language model seam over the `ai-llm-service` clients.

use ai_llm_service::{
    AiLlmError, ChatMessage,
    services::{ollama_service::OllamaService, open_ai_service::OpenAiService},
};
use futures::future::BoxFuture;

/// What the engine needs from a model.
pub trait LanguageModel: Send + Sync {
    /// Model identifier, for logs.
    fn name(&self) -> &str;

    /// Raw completion: `prompt` is sent without any chat template.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>>;

    /// Chat completion over role-tagged messages.
    fn chat<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, AiLlmError>>;
}

impl LanguageModel for OllamaService {
    fn name(&self) -> &str {
        self.model()
    }

    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(self.generate(prompt, true))
    }

    fn chat<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(OllamaService::chat(self, messages))
    }
}

impl LanguageModel for OpenAiService {
    fn name(&self) -> &str {
        self.model()
    }

    /// OpenAI has no raw completion endpoint here; the prompt becomes a single user message.
    fn complete<'a>(&'a self, prompt: &'a str) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(async move { OpenAiService::chat(self, &[ChatMessage::user(prompt)]).await })
    }

    fn chat<'a>(&'a self, messages: &'a [ChatMessage]) -> BoxFuture<'a, Result<String, AiLlmError>> {
        Box::pin(OpenAiService::chat(self, messages))
    }
}
