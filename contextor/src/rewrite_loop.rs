//! Query rewrite loop.
//!
//! After each retrieval the model judges whether the documents answer the
//! question. On "no" it rewrites the question and retrieval runs again, at
//! most `max_attempts` times. Model failures stop the loop and keep the
//! last question.

use conversation::RetrievedDocument;
use tracing::{debug, info, warn};

use crate::error::ContextorError;
use crate::llm::LanguageModel;
use crate::prompt::{clean_rewrite, is_affirmative, relevance_check_messages, render_context, rewrite_messages};
use crate::retrieve::HybridRetriever;

/// Final question and the documents retrieved for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolved {
    pub question: String,
    pub docs: Vec<RetrievedDocument>,
    pub attempts: usize,
}

pub async fn resolve_question(
    model: &dyn LanguageModel,
    retriever: &HybridRetriever,
    question: &str,
    max_attempts: usize,
    max_ctx_chars: usize,
) -> Result<Resolved, ContextorError> {
    let mut current = question.to_string();
    let mut docs = retriever.retrieve(&current).await?;
    let mut attempts = 0usize;

    while attempts < max_attempts {
        let context = render_context(&docs, max_ctx_chars);
        let verdict = match model.chat(&relevance_check_messages(&current, &context)).await {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "relevance check failed, keeping question");
                break;
            }
        };
        if is_affirmative(&verdict) {
            debug!(attempts, "documents answer the question");
            break;
        }

        let rewritten = match model.chat(&rewrite_messages(&current)).await {
            Ok(r) => clean_rewrite(&r),
            Err(e) => {
                warn!(error = %e, "rewrite failed, keeping question");
                break;
            }
        };
        attempts += 1;
        if rewritten.is_empty() || rewritten == current {
            break;
        }
        info!(from = %current, to = %rewritten, attempts, "question rewritten");
        current = rewritten;
        docs = retriever.retrieve(&current).await?;
    }

    Ok(Resolved {
        question: current,
        docs,
        attempts,
    })
}
