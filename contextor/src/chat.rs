//! One chat turn end to end: backend call, then canonical assembly.

use conversation::{ConversationTurn, DocumentCitation, InteractionResult, TurnInput, assemble};
use tracing::{debug, info};

use crate::backend::ChatBackend;
use crate::error::ContextorError;

/// Runs `prompt` through the backend and returns the canonical result.
///
/// # Errors
/// - [`ContextorError::EngineFailure`] when the backend cannot answer
/// - [`ContextorError::Conversation`] when its envelope is malformed
pub async fn handle_chat(
    backend: &dyn ChatBackend,
    prompt: &str,
    history: Vec<ConversationTurn>,
    caller_docs: Vec<DocumentCitation>,
    rewrite_enabled: bool,
) -> Result<InteractionResult, ContextorError> {
    debug!(
        history = history.len(),
        caller_docs = caller_docs.len(),
        "chat turn started"
    );
    let (raw_history, envelope) = backend.handle_interaction(prompt, &history).await?;

    let result = assemble(
        TurnInput {
            prompt,
            caller_docs,
            rewrite_enabled,
        },
        raw_history,
        &envelope,
        &backend.shape(),
    )?;

    info!(
        documents = result.documents.len(),
        rewritten = result.rewritten,
        reply_len = result.reply.len(),
        "chat turn completed"
    );
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conversation::{EnvelopeShape, RawHistory, ResponseEnvelope, RetrievedDocument};

    use crate::testing::FakeBackend;

    fn local(text: &str) -> FakeBackend {
        FakeBackend::new(
            EnvelopeShape::Local {
                assistant_token: "<assistant>".into(),
            },
            RawHistory::Messages(vec![]),
            ResponseEnvelope::new()
                .with_field("text", text)
                .with_field("question", "What is X?"),
        )
    }

    #[tokio::test]
    async fn local_turn_without_docs() {
        let backend = local("...<assistant>The answer is 42.");
        let out = handle_chat(&backend, "What is X?", vec![], vec![], false)
            .await
            .unwrap();

        assert_eq!(out.reply, "The answer is 42.");
        assert_eq!(out.history, vec![ConversationTurn::assistant("The answer is 42.")]);
        assert!(out.documents.is_empty());
        assert!(!out.rewritten);
        assert_eq!(out.question, "What is X?");
    }

    #[tokio::test]
    async fn caller_docs_kept_when_backend_has_none() {
        let backend = local("<assistant>ok");
        let caller = vec![DocumentCitation {
            source: "a.txt".into(),
            content: "A".into(),
            store_key: None,
            provenance: None,
        }];

        let out = handle_chat(&backend, "What is X?", vec![], caller.clone(), false)
            .await
            .unwrap();
        assert_eq!(out.documents, caller);
    }

    #[tokio::test]
    async fn missing_delimiter_is_malformed() {
        let backend = local("no token here");
        let err = handle_chat(&backend, "What is X?", vec![], vec![], false)
            .await
            .unwrap_err();
        assert!(matches!(err, ContextorError::Conversation(_)));
    }

    #[tokio::test]
    async fn cloud_pairs_are_resolved() {
        let backend = FakeBackend::new(
            EnvelopeShape::Cloud,
            RawHistory::Pairs(vec![
                ("human".into(), "hi".into()),
                ("ai".into(), "hello".into()),
                ("user".into(), "{question}".into()),
            ]),
            ResponseEnvelope::new()
                .with_field("answer", "Paris.")
                .with_field("question", "What is the capital of France?")
                .with_docs(vec![
                    RetrievedDocument::new("Paris is the capital.")
                        .with_meta("source", "fr.txt")
                        .with_meta("pk", 12)
                        .with_meta("provenance", 0.9),
                ]),
        );

        let out = handle_chat(&backend, "capital?", vec![], vec![], true)
            .await
            .unwrap();

        assert_eq!(out.history.len(), 4);
        assert_eq!(out.history[2].content, "What is the capital of France?");
        assert_eq!(out.history[3], ConversationTurn::assistant("Paris."));
        assert!(out.rewritten);
        assert_eq!(out.documents.len(), 1);
        assert_eq!(out.documents[0].store_key.as_deref(), Some("12"));
        assert_eq!(out.documents[0].provenance, Some(0.9));
    }
}
