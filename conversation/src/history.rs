//! Canonical conversation history.

use serde::{Deserialize, Serialize};

use crate::error::ConversationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Parses the role names used by the generation backends.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "user" | "human" => Some(Role::User),
            "assistant" | "ai" => Some(Role::Assistant),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Ordered turns, oldest first.
pub type History = Vec<ConversationTurn>;

/// History exactly as a backend returned it, before normalisation.
#[derive(Clone, Debug, PartialEq)]
pub enum RawHistory {
    /// Role/content messages (Local backend).
    Messages(Vec<ConversationTurn>),
    /// Positional `(role, content)` pairs (Cloud backend).
    Pairs(Vec<(String, String)>),
}

impl RawHistory {
    pub fn len(&self) -> usize {
        match self {
            RawHistory::Messages(m) => m.len(),
            RawHistory::Pairs(p) => p.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts into role/content messages.
    ///
    /// # Errors
    /// [`ConversationError::MalformedEnvelope`] if a pair names an unknown role.
    pub fn into_turns(self) -> Result<History, ConversationError> {
        match self {
            RawHistory::Messages(m) => Ok(m),
            RawHistory::Pairs(pairs) => pairs
                .into_iter()
                .map(|(role, content)| {
                    Role::parse(&role)
                        .map(|role| ConversationTurn { role, content })
                        .ok_or_else(|| {
                            ConversationError::malformed(format!("unknown history role `{role}`"))
                        })
                })
                .collect(),
        }
    }
}
