/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// This enum distinguishes between a local Ollama runtime and the OpenAI API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI's chat/embeddings API (or any compatible endpoint).
    OpenAI,
}

impl LlmProvider {
    /// Parses a provider name (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "ollama" => Some(LlmProvider::Ollama),
            "openai" | "chatgpt" => Some(LlmProvider::OpenAI),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(LlmProvider::parse("Ollama"), Some(LlmProvider::Ollama));
        assert_eq!(LlmProvider::parse(" OPENAI "), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::parse("gemini"), None);
    }
}
