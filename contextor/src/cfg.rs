//! Runtime configuration loaded from environment variables.

use ai_llm_service::LlmProvider;
use ai_llm_service::error_handler::{env_flag, opt_env};
use rag_store::RagConfig;

use crate::error::ContextorError;
use crate::prompt::PromptTokens;

/// Which backend variant serves the process. Chosen once at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Raw completion through Ollama `/api/generate` with role tokens.
    Local,
    /// Chat completion through the given provider.
    Cloud(LlmProvider),
}

/// Rewrite loop settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewriteSettings {
    pub enabled: bool,
    pub max_attempts: usize,
}

/// Hybrid retrieval knobs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RetrievalSettings {
    pub vector_k: u64,
    pub keyword_k: usize,
    /// Weight of the vector channel, in `[0, 1]`.
    pub hybrid_alpha: f64,
    /// Documents kept after fusion.
    pub limit: usize,
    /// Character budget of the context block in prompts.
    pub max_ctx_chars: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            vector_k: 8,
            keyword_k: 8,
            hybrid_alpha: 0.5,
            limit: 8,
            max_ctx_chars: 8000,
        }
    }
}

/// Config bag for the engine. All fields have defaults via `from_env`.
#[derive(Clone, Debug)]
pub struct ContextorConfig {
    pub backend: BackendKind,
    pub rewrite: RewriteSettings,
    pub retrieval: RetrievalSettings,
    pub tokens: PromptTokens,
    pub rag: RagConfig,
}

impl ContextorConfig {
    /// Build from environment variables with sensible defaults.
    ///
    /// # Errors
    /// [`ContextorError::Config`] for unparsable numbers, an empty assistant
    /// token, an out-of-range `hybrid_alpha` or an unsupported provider flag.
    pub fn from_env() -> Result<Self, ContextorError> {
        let backend = select_backend(env_flag)?;

        let rewrite = RewriteSettings {
            enabled: env_flag("use_rewrite_loop"),
            max_attempts: parse("rewrite_max_attempts", 3usize)?,
        };

        let defaults = RetrievalSettings::default();
        let vector_k = parse("vector_store_k", defaults.vector_k)?;
        let keyword_k = parse("keyword_k", defaults.keyword_k)?;
        let retrieval = RetrievalSettings {
            vector_k,
            keyword_k,
            hybrid_alpha: parse("hybrid_alpha", defaults.hybrid_alpha)?,
            limit: parse("retrieval_limit", (vector_k as usize).max(keyword_k))?,
            max_ctx_chars: parse("max_ctx_chars", defaults.max_ctx_chars)?,
        };

        let tokens = PromptTokens {
            system: env("llm_system_token", "<|system|>"),
            user: env("llm_user_token", "<|user|>"),
            assistant: env("llm_assistant_token", "<|assistant|>"),
            end: env("llm_end_token", "</s>"),
        };

        let cfg = Self {
            backend,
            rewrite,
            retrieval,
            tokens,
            rag: RagConfig::from_env()?,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ContextorError> {
        if self.tokens.assistant.is_empty() {
            return Err(ContextorError::Config(
                "llm_assistant_token must not be empty".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.retrieval.hybrid_alpha) {
            return Err(ContextorError::Config(
                "hybrid_alpha must be within [0, 1]".into(),
            ));
        }
        if self.retrieval.limit == 0 {
            return Err(ContextorError::Config("retrieval_limit must be > 0".into()));
        }
        Ok(())
    }
}

/// Provider flags with no client in this build. Setting one is an error
/// rather than a silent fall back to the local backend.
const UNSUPPORTED_PROVIDER_FLAGS: [&str; 2] = ["use_gemini", "use_azure"];

/// Backend choice from boolean flags. `use_openai` wins over `use_ollama`;
/// no flag selects the local backend.
fn select_backend(flag: impl Fn(&str) -> bool) -> Result<BackendKind, ContextorError> {
    if let Some(name) = UNSUPPORTED_PROVIDER_FLAGS.into_iter().find(|&k| flag(k)) {
        return Err(ContextorError::Config(format!(
            "{name}: provider not supported, set use_openai or use_ollama instead"
        )));
    }
    Ok(if flag("use_openai") {
        BackendKind::Cloud(LlmProvider::OpenAI)
    } else if flag("use_ollama") {
        BackendKind::Cloud(LlmProvider::Ollama)
    } else {
        BackendKind::Local
    })
}

fn env(k: &str, dflt: &str) -> String {
    opt_env(k).unwrap_or_else(|| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> Result<T, ContextorError> {
    match opt_env(k) {
        Some(v) => v
            .trim()
            .parse::<T>()
            .map_err(|_| ContextorError::Config(format!("{k}: cannot parse `{v}`"))),
        None => Ok(dflt),
    }
}
