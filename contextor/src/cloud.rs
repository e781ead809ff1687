//! Cloud backend: chat completion with the retrieved context in the system
//! message. History goes back to the caller as positional `(role, content)` pairs.

use ai_llm_service::ChatMessage;
use conversation::envelope::{ANSWER_FIELD, CONTEXT_FIELD, QUESTION_FIELD};
use conversation::{ConversationTurn, EnvelopeShape, RawHistory, ResponseEnvelope, Role};
use futures::future::BoxFuture;
use tracing::{debug, instrument};

use crate::backend::{ChatBackend, RagEngine};
use crate::error::ContextorError;
use crate::prompt::system_with_context;

const QUESTION_TEMPLATE: &str = "{question}";

pub struct CloudBackend {
    engine: RagEngine,
}

impl CloudBackend {
    pub fn new(engine: RagEngine) -> Self {
        Self { engine }
    }

    #[instrument(skip_all, fields(model = %self.engine.model().name(), turns = history.len()))]
    async fn interact(
        &self,
        prompt: &str,
        history: &[ConversationTurn],
    ) -> Result<(RawHistory, ResponseEnvelope), ContextorError> {
        let resolved = self.engine.resolve(prompt).await?;
        let context = self.engine.render_context(&resolved);

        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(ChatMessage::system(system_with_context(&context)));
        messages.extend(history.iter().map(|t| match t.role {
            Role::User => ChatMessage::user(t.content.clone()),
            Role::Assistant => ChatMessage::assistant(t.content.clone()),
        }));
        messages.push(ChatMessage::user(resolved.question.clone()));

        let answer = self
            .engine
            .model()
            .chat(&messages)
            .await
            .map_err(ContextorError::engine)?;
        debug!(answer_len = answer.len(), "cloud answer");

        let mut pairs: Vec<(String, String)> = history
            .iter()
            .map(|t| (t.role.as_str().to_string(), t.content.clone()))
            .collect();
        pairs.push((Role::User.as_str().to_string(), QUESTION_TEMPLATE.to_string()));

        let envelope = ResponseEnvelope::new()
            .with_field(ANSWER_FIELD, answer)
            .with_field(QUESTION_FIELD, resolved.question)
            .with_field(CONTEXT_FIELD, context)
            .with_docs(resolved.docs);
        Ok((RawHistory::Pairs(pairs), envelope))
    }
}

impl ChatBackend for CloudBackend {
    fn shape(&self) -> EnvelopeShape {
        EnvelopeShape::Cloud
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
    use std::sync::atomic::Ordering;

    use conversation::{ConversationTurn, DocumentCitation};

    use ai_llm_service::LlmProvider;

    use crate::cfg::BackendKind;
    use crate::chat::handle_chat;
    use crate::testing::{ScriptedModel, config, embedder};
    use crate::Contextor;

    async fn contextor(dir: &std::path::Path, model: Arc<ScriptedModel>, rewrite: bool) -> Contextor {
        std::fs::write(dir.join("x.txt"), "The answer to X is 42.").unwrap();
        std::fs::write(dir.join("pets.txt"), "Cats sleep most of the day.").unwrap();
        let cfg = config(dir, BackendKind::Cloud(LlmProvider::OpenAI), rewrite);
        let ctx = Contextor::with_parts(cfg, embedder(), model).await.unwrap();
        ctx.backend.add_document("x.txt").await.unwrap();
        ctx.backend.add_document("pets.txt").await.unwrap();
        ctx
    }

    #[tokio::test]
    async fn answer_field_is_reply() {
        let dir = tempfile::tempdir().unwrap();
        let model = Arc::new(ScriptedModel::chatting(&["It is 42."]));
        let ctx = contextor(dir.path(), model.clone(), false).await;
        let history = vec![ConversationTurn::user("hi"), ConversationTurn::assistant("hello")];

        let out = handle_chat(ctx.backend.as_ref(), "What is X?", history, vec![], false)
            .await
            .unwrap();

        assert_eq!(out.reply, "It is 42.");
        let contents: Vec<&str> = out.history.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello", "What is X?", "It is 42."]);
        assert!(out.documents.iter().any(|d| d.source.ends_with("x.txt")));
        assert_eq!(model.chat_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retrieved_docs_replace_caller_docs() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = contextor(dir.path(), Arc::new(ScriptedModel::chatting(&["ok"])), false).await;
        let pinned = DocumentCitation {
            source: "pinned.txt".into(),
            content: "pinned".into(),
            store_key: Some("7".into()),
            provenance: None,
        };

        let out = handle_chat(ctx.backend.as_ref(), "What is X?", vec![], vec![pinned], false)
            .await
            .unwrap();
        assert!(!out.documents.is_empty());
        assert!(out.documents.iter().all(|d| d.source != "pinned.txt"));
        assert!(out.documents.iter().all(|d| d.store_key.is_some()));
    }

    #[tokio::test]
    async fn rewrite_loop_reports_new_question() {
        let dir = tempfile::tempdir().unwrap();
        // relevance "no", rewrite, relevance "yes", answer
        let model = Arc::new(ScriptedModel::chatting(&[
            "no",
            "What do cats do all day?",
            "yes",
            "They sleep.",
        ]));
        let ctx = contextor(dir.path(), model.clone(), true).await;

        let out = handle_chat(ctx.backend.as_ref(), "pets?", vec![], vec![], true)
            .await
            .unwrap();

        assert!(out.rewritten);
        assert_eq!(out.question, "What do cats do all day?");
        assert_eq!(out.reply, "They sleep.");
        assert_eq!(out.history[0].content, "What do cats do all day?");
        assert_eq!(model.chat_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn rewrite_disabled_never_reports_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = contextor(dir.path(), Arc::new(ScriptedModel::chatting(&["fine"])), false).await;

        let out = handle_chat(ctx.backend.as_ref(), "pets?", vec![], vec![], false)
            .await
            .unwrap();
        assert!(!out.rewritten);
        assert_eq!(out.question, "pets?");
    }
}
