//! Backend response envelope.
//!
//! An envelope is produced by one backend call and consumed read-only while
//! building the response for that same request. Scalar fields (`answer`,
//! `text`, `question`, `context`, ...) live in a JSON map; retrieved
//! documents are typed.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Field holding the reply of a Cloud backend.
pub const ANSWER_FIELD: &str = "answer";
/// Field holding the raw generated text of a Local backend.
pub const TEXT_FIELD: &str = "text";
/// Field holding the backend's resolved (possibly rewritten) question.
pub const QUESTION_FIELD: &str = "question";
/// Field holding the retrieved context rendered into the prompt.
pub const CONTEXT_FIELD: &str = "context";
/// Placeholder name under which the documents are exposed to templates.
pub const DOCS_FIELD: &str = "docs";

/// A document as retrieved by the engine, before citation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RetrievedDocument {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_meta(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.to_string(), value.into());
        self
    }
}

/// Which backend shape produced an envelope.
///
/// This is the single point where callers distinguish the two variants.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// Raw completion: reply follows the last `assistant_token` in `text`.
    Local { assistant_token: String },
    /// Chat completion: reply is the `answer` field.
    Cloud,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseEnvelope {
    fields: Map<String, Value>,
    docs: Option<Vec<RetrievedDocument>>,
}

impl ResponseEnvelope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn with_docs(mut self, docs: Vec<RetrievedDocument>) -> Self {
        self.docs = Some(docs);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.fields.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Resolved question, if the backend reported one.
    pub fn question(&self) -> Option<&str> {
        self.get_str(QUESTION_FIELD)
    }

    /// `Some` when the envelope carries a `docs` field, even an empty one.
    pub fn docs(&self) -> Option<&[RetrievedDocument]> {
        self.docs.as_deref()
    }

    pub fn has_docs(&self) -> bool {
        self.docs.is_some()
    }
}
