use conversation::{ConversationTurn, DocumentCitation};
use serde::Deserialize;

/// Request payload for /chat.
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// The user's new message.
    pub prompt: String,
    /// Prior turns, oldest first.
    #[serde(default)]
    pub history: Vec<ConversationTurn>,
    /// Citations from the previous turn; replaced whenever the backend
    /// returns documents of its own.
    #[serde(default)]
    pub docs: Vec<DocumentCitation>,
}
