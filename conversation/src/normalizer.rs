//! History Normalizer: backend envelope → canonical history + reply.

use tracing::debug;

use crate::envelope::{ANSWER_FIELD, EnvelopeShape, ResponseEnvelope, TEXT_FIELD};
use crate::error::ConversationError;
use crate::history::{ConversationTurn, History, RawHistory};
use crate::template::render;

/// Canonical history and the reply extracted from one envelope.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedTurn {
    pub history: History,
    pub reply: String,
}

/// Resolves placeholders in every turn of `raw`, then appends the reply as
/// a new assistant turn. Turns without a known placeholder come back
/// byte-for-byte.
///
/// # Errors
/// [`ConversationError::MalformedEnvelope`] when the reply cannot be
/// extracted or a history role is unknown.
pub fn normalize(
    raw: RawHistory,
    envelope: &ResponseEnvelope,
    shape: &EnvelopeShape,
) -> Result<NormalizedTurn, ConversationError> {
    let reply = extract_reply(envelope, shape)?;

    let mut history: History = raw
        .into_turns()?
        .into_iter()
        .map(|turn| ConversationTurn {
            role: turn.role,
            content: render(&turn.content, envelope),
        })
        .collect();
    history.push(ConversationTurn::assistant(reply.clone()));

    debug!(turns = history.len(), reply_len = reply.len(), "history normalized");
    Ok(NormalizedTurn { history, reply })
}

/// Reads the reply out of an envelope according to its shape.
pub fn extract_reply(
    envelope: &ResponseEnvelope,
    shape: &EnvelopeShape,
) -> Result<String, ConversationError> {
    match shape {
        EnvelopeShape::Local { assistant_token } => {
            let text = envelope.get_str(TEXT_FIELD).ok_or_else(|| {
                ConversationError::malformed(format!("missing string field `{TEXT_FIELD}`"))
            })?;
            reply_after_delimiter(text, assistant_token)
        }
        EnvelopeShape::Cloud => envelope
            .get_str(ANSWER_FIELD)
            .map(str::to_string)
            .ok_or_else(|| {
                ConversationError::malformed(format!("missing string field `{ANSWER_FIELD}`"))
            }),
    }
}

/// Everything after the last occurrence of `delimiter` in `text`.
pub fn reply_after_delimiter(text: &str, delimiter: &str) -> Result<String, ConversationError> {
    if delimiter.is_empty() {
        return Err(ConversationError::malformed("assistant delimiter is empty"));
    }
    text.rfind(delimiter)
        .map(|pos| text[pos + delimiter.len()..].to_string())
        .ok_or_else(|| {
            ConversationError::malformed(format!(
                "assistant delimiter `{delimiter}` not found in generated text"
            ))
        })
}
