//! Canonical form of a chat turn.
//!
//! Backends answer in one of two shapes ([`EnvelopeShape`]). This crate
//! turns either shape into the same [`InteractionResult`]:
//! - [`normalizer`]: reply extraction and history placeholder resolution
//! - [`citations`]: which documents back the reply, and their citation form
//! - [`rewrite`]: whether the backend answered a rewritten question
//!
//! Everything here is pure and synchronous.

pub mod citations;
pub mod envelope;
pub mod error;
pub mod history;
pub mod interaction;
pub mod normalizer;
pub mod rewrite;
pub mod template;

pub use citations::{DocumentCitation, extract_citations, select_citations};
pub use envelope::{EnvelopeShape, ResponseEnvelope, RetrievedDocument};
pub use error::ConversationError;
pub use history::{ConversationTurn, History, RawHistory, Role};
pub use interaction::{InteractionResult, TurnInput, assemble};
pub use normalizer::{NormalizedTurn, normalize};
pub use rewrite::{RewriteOutcome, detect_rewrite};
