//! Prompt builders: system message, context block, raw role-token prompts
//! and the two rewrite-loop prompts.

use ai_llm_service::ChatMessage;
use conversation::{ConversationTurn, RetrievedDocument, Role};

/// Default system instructions for document-grounded answers.
pub const DEFAULT_SYSTEM: &str = "You are a helpful assistant that answers questions using the provided documents. \
Use the context as ground truth; if it does not contain the answer, say that you do not know.";

/// Role tokens of a raw-completion model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PromptTokens {
    pub system: String,
    pub user: String,
    pub assistant: String,
    pub end: String,
}

impl Default for PromptTokens {
    fn default() -> Self {
        Self {
            system: "<|system|>".into(),
            user: "<|user|>".into(),
            assistant: "<|assistant|>".into(),
            end: "</s>".into(),
        }
    }
}

/// Renders retrieved documents into a numbered context block of at most
/// `max_chars` bytes, preserving ranking order.
pub fn render_context(docs: &[RetrievedDocument], max_chars: usize) -> String {
    let mut out = String::new();
    for (i, d) in docs.iter().enumerate() {
        let source = d
            .metadata
            .get("source")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        let header = format!("[{}] {}\n", i + 1, source);
        let body = d.page_content.trim();

        let remaining = max_chars.saturating_sub(out.len());
        if header.len() >= remaining {
            break;
        }
        out.push_str(&header);
        let remaining = remaining - header.len();
        if body.len() + 2 > remaining {
            out.push_str(safe_truncate(body, remaining.saturating_sub(2)));
            out.push_str("\n\n");
            break;
        }
        out.push_str(body);
        out.push_str("\n\n");
    }
    out.trim_end().to_string()
}

/// System message with the context block appended.
pub fn system_with_context(context: &str) -> String {
    if context.is_empty() {
        DEFAULT_SYSTEM.to_string()
    } else {
        format!("{DEFAULT_SYSTEM}\n\nContext:\n{context}")
    }
}

/// Raw prompt for the Local backend. Always ends with the assistant token,
/// so the generated text follows the token's last occurrence.
pub fn render_local_prompt(
    tokens: &PromptTokens,
    system: &str,
    history: &[ConversationTurn],
    question: &str,
) -> String {
    let mut out = String::new();
    push_turn(&mut out, &tokens.system, system, &tokens.end);
    for turn in history {
        let tok = match turn.role {
            Role::User => &tokens.user,
            Role::Assistant => &tokens.assistant,
        };
        push_turn(&mut out, tok, &turn.content, &tokens.end);
    }
    push_turn(&mut out, &tokens.user, question, &tokens.end);
    out.push_str(&tokens.assistant);
    out
}

fn push_turn(out: &mut String, token: &str, content: &str, end: &str) {
    out.push_str(token);
    out.push('\n');
    out.push_str(content);
    out.push_str(end);
    out.push('\n');
}

/// Asks the model whether the context answers the question (`yes`/`no`).
pub fn relevance_check_messages(question: &str, context: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You judge whether documents contain the answer to a question. \
Reply with a single word: yes or no.",
        ),
        ChatMessage::user(format!(
            "Documents:\n{context}\n\nQuestion: {question}\n\nDo the documents answer the question?"
        )),
    ]
}

/// Asks the model to rephrase the question for better retrieval.
pub fn rewrite_messages(question: &str) -> Vec<ChatMessage> {
    vec![
        ChatMessage::system(
            "You rewrite search questions so they retrieve better documents. \
Keep the meaning. Reply with the rewritten question only.",
        ),
        ChatMessage::user(question.to_string()),
    ]
}

/// `true` when a model reply to [`relevance_check_messages`] means yes.
pub fn is_affirmative(reply: &str) -> bool {
    reply
        .trim()
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_ascii_lowercase()
        .starts_with("yes")
}

/// Strips whitespace and wrapping quotes from a rewritten question.
pub fn clean_rewrite(reply: &str) -> String {
    reply
        .trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim()
        .to_string()
}

fn safe_truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        s
    } else {
        let mut end = max;
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        &s[..end]
    }
}
