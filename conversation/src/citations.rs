//! Citation Extractor.
//!
//! Decides whether the documents of a turn come from the envelope or from
//! the caller, and turns retrieved documents into citations.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::envelope::{ResponseEnvelope, RetrievedDocument};
use crate::error::ConversationError;

/// Metadata key naming the document a chunk came from.
pub const SOURCE_KEY: &str = "source";
/// Metadata key holding the vector store primary key.
pub const PK_KEY: &str = "pk";
/// Metadata key holding the relevance score.
pub const PROVENANCE_KEY: &str = "provenance";

/// Wire form uses the compact keys `s` and `c`; `source`/`content` are
/// accepted on input.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DocumentCitation {
    #[serde(rename = "s", alias = "source")]
    pub source: String,
    #[serde(rename = "c", alias = "content", default)]
    pub content: String,
    #[serde(
        rename = "pk",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "de_opt_key"
    )]
    pub store_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provenance: Option<f64>,
}

/// Applies the source-selection rule and derives citations.
///
/// Envelope documents win when the caller sent none or the envelope carries
/// a `docs` field; otherwise the caller's citations are returned unchanged.
/// The result is never a mix of both.
pub fn select_citations(
    caller_docs: Vec<DocumentCitation>,
    envelope: &ResponseEnvelope,
) -> Result<Vec<DocumentCitation>, ConversationError> {
    if caller_docs.is_empty() || envelope.has_docs() {
        extract_citations(envelope.docs().unwrap_or(&[]))
    } else {
        Ok(caller_docs)
    }
}

/// One citation per document that has a `source`, in input order.
///
/// # Errors
/// [`ConversationError::MalformedEnvelope`] if a `provenance` value is not numeric.
pub fn extract_citations(
    docs: &[RetrievedDocument],
) -> Result<Vec<DocumentCitation>, ConversationError> {
    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        let Some(source) = doc.metadata.get(SOURCE_KEY).and_then(key_to_string) else {
            continue;
        };
        let store_key = doc.metadata.get(PK_KEY).and_then(key_to_string);
        let provenance = match doc.metadata.get(PROVENANCE_KEY) {
            None | Some(Value::Null) => None,
            Some(v) => Some(to_f64(v).ok_or_else(|| {
                ConversationError::malformed(format!(
                    "provenance of `{source}` is not numeric: {v}"
                ))
            })?),
        };
        out.push(DocumentCitation {
            source,
            content: doc.page_content.clone(),
            store_key,
            provenance,
        });
    }
    Ok(out)
}

fn key_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

fn de_opt_key<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Value>::deserialize(d)?.as_ref().and_then(key_to_string))
}
