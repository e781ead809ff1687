//! Local backend: one raw prompt rendered with role tokens, completed by
//! Ollama `/api/generate` in raw mode.

use conversation::envelope::{CONTEXT_FIELD, QUESTION_FIELD, TEXT_FIELD};
use conversation::{ConversationTurn, EnvelopeShape, RawHistory, ResponseEnvelope};
use futures::future::BoxFuture;
use tracing::{debug, instrument};

use crate::backend::{ChatBackend, RagEngine};
use crate::error::ContextorError;
use crate::prompt::{PromptTokens, render_local_prompt, system_with_context};

/// Placeholder stored as the user turn; resolved from the envelope's `question`.
const QUESTION_TEMPLATE: &str = "{question}";

pub struct LocalBackend {
    engine: RagEngine,
    tokens: PromptTokens,
}

impl LocalBackend {
    pub fn new(engine: RagEngine, tokens: PromptTokens) -> Self {
        Self { engine, tokens }
    }

    #[instrument(skip_all, fields(model = %self.engine.model().name(), turns = history.len()))]
    async fn interact(
        &self,
        prompt: &str,
        history: &[ConversationTurn],
    ) -> Result<(RawHistory, ResponseEnvelope), ContextorError> {
        let resolved = self.engine.resolve(prompt).await?;
        let context = self.engine.render_context(&resolved);

        let raw_prompt = render_local_prompt(
            &self.tokens,
            &system_with_context(&context),
            history,
            &resolved.question,
        );
        let completion = self
            .engine
            .model()
            .complete(&raw_prompt)
            .await
            .map_err(ContextorError::engine)?;
        debug!(completion_len = completion.len(), "local completion");

        // The envelope text echoes the prompt, so the reply follows the last assistant token.
        let text = format!("{raw_prompt}{completion}");

        let mut turns = history.to_vec();
        turns.push(ConversationTurn::user(QUESTION_TEMPLATE));

        let envelope = ResponseEnvelope::new()
            .with_field(TEXT_FIELD, text)
            .with_field(QUESTION_FIELD, resolved.question)
            .with_field(CONTEXT_FIELD, context)
            .with_docs(resolved.docs);
        Ok((RawHistory::Messages(turns), envelope))
    }
}

impl ChatBackend for LocalBackend {
    fn shape(&self) -> EnvelopeShape {
        EnvelopeShape::Local {
            assistant_token: self.tokens.assistant.clone(),
        }
    }

    fn handle_interaction<'a>(
        &'a self,
        prompt: &'a str,
        history: &'a [ConversationTurn],
    ) -> BoxFuture<'a, Result<(RawHistory, ResponseEnvelope), ContextorError>> {
        Box::pin(self.interact(prompt, history))
    }

    fn add_document<'a>(&'a self, filename: &'a str) -> BoxFuture<'a, Result<(), ContextorError>> {
        Box::pin(async move { self.engine.add_document(filename).await.map(|_| ()) })
    }

    fn reload(&self) -> BoxFuture<'_, Result<(), ContextorError>> {
        Box::pin(async move { self.engine.reload().await.map(|_| ()) })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use conversation::Role;

    use crate::cfg::BackendKind;
    use crate::chat::handle_chat;
    use crate::testing::{ScriptedModel, config, embedder};
    use crate::{Contextor, ContextorError};

    async fn contextor(dir: &std::path::Path, model: Arc<ScriptedModel>, rewrite: bool) -> Contextor {
        std::fs::write(dir.join("x.txt"), "The answer to X is 42.\n\nY is unrelated.").unwrap();
        let ctx = Contextor::with_parts(config(dir, BackendKind::Local, rewrite), embedder(), model)
            .await
            .unwrap();
        ctx.backend.add_document("x.txt").await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn reply_is_text_after_assistant_token() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::completing(&["The answer is 42."]));
        let ctx = contextor(dir.path(), model.clone(), false).await;

        let out = handle_chat(ctx.backend.as_ref(), "What is X?", vec![], vec![], false)
            .await
            .unwrap();

        assert_eq!(out.reply, "The answer is 42.");
        assert_eq!(out.question, "What is X?");
        assert!(!out.rewritten);
        assert_eq!(out.history.len(), 2);
        assert_eq!(out.history[0].role, Role::User);
        assert_eq!(out.history[0].content, "What is X?");
        assert_eq!(out.history[1].content, "The answer is 42.");

        assert!(!out.documents.is_empty());
        assert!(out.documents[0].source.ends_with("x.txt"));

        let prompt = &model.prompts.lock().unwrap()[0];
        assert!(prompt.contains("The answer to X is 42."));
        assert!(prompt.ends_with("<|assistant|>"));
    }

    #[tokio::test]
    async fn earlier_turns_are_kept_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::completing(&["Still 42."]));
        let ctx = contextor(dir.path(), model.clone(), false).await;
        let history = vec![
            conversation::ConversationTurn::user("What is X?"),
            conversation::ConversationTurn::assistant("42."),
        ];

        let out = handle_chat(ctx.backend.as_ref(), "Are you sure?", history, vec![], false)
            .await
            .unwrap();

        let contents: Vec<&str> = out.history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["What is X?", "42.", "Are you sure?", "Still 42."]);
        assert!(model.prompts.lock().unwrap()[0].contains("<|assistant|>\n42.</s>"));
    }

    #[tokio::test]
    async fn model_failure_is_engine_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = contextor(dir.path(), Arc::new(ScriptedModel::default()), false).await;

        let err = handle_chat(ctx.backend.as_ref(), "What is X?", vec![], vec![], false)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextorError::EngineFailure(_)));
    }
}
