//! Assembly of the canonical chat response.

use serde::Serialize;

use crate::citations::{DocumentCitation, select_citations};
use crate::envelope::{EnvelopeShape, ResponseEnvelope};
use crate::error::ConversationError;
use crate::history::{History, RawHistory};
use crate::normalizer::normalize;
use crate::rewrite::detect_rewrite;

/// Canonical outcome of one chat turn.
///
/// `rewritten == true` implies `question` differs from the submitted prompt.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InteractionResult {
    pub reply: String,
    pub history: History,
    pub documents: Vec<DocumentCitation>,
    pub rewritten: bool,
    pub question: String,
}

/// Everything a turn needs besides the backend output.
#[derive(Clone, Debug)]
pub struct TurnInput<'a> {
    pub prompt: &'a str,
    pub caller_docs: Vec<DocumentCitation>,
    pub rewrite_enabled: bool,
}

/// Runs the normalizer, citation extractor and rewrite detector over one envelope.
pub fn assemble(
    input: TurnInput<'_>,
    raw_history: RawHistory,
    envelope: &ResponseEnvelope,
    shape: &EnvelopeShape,
) -> Result<InteractionResult, ConversationError> {
    let turn = normalize(raw_history, envelope, shape)?;
    let documents = select_citations(input.caller_docs, envelope)?;
    let rewrite = detect_rewrite(input.prompt, envelope.question(), input.rewrite_enabled);

    Ok(InteractionResult {
        reply: turn.reply,
        history: turn.history,
        documents,
        rewritten: rewrite.rewritten,
        question: rewrite.question,
    })
}
