//! Shared log formatting for the workspace.
//!
//! The binary composes [`layer`] with a global `EnvFilter`; the layer itself
//! only renders events emitted by workspace crates, so chatty dependencies
//! (hyper, h2, tonic) stay quiet unless explicitly enabled.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Crate target prefix of this library.
pub const TARGET_PREFIX: &str = "ai_llm_service";

/// Targets rendered by [`layer`]: every crate of the workspace.
pub const WORKSPACE_TARGETS: &[&str] = &[
    "doc_chat_backend",
    "api",
    "contextor",
    "conversation",
    "rag_store",
    TARGET_PREFIX,
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-09-12T10:20:30Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        // Keep timestamps compact: no fractional seconds, Z-suffix
        let s = now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        w.write_str(&s)
    }
}

/// Returns `true` if `target` belongs to one of the workspace crates.
pub fn is_workspace_target(target: &str) -> bool {
    WORKSPACE_TARGETS.iter().any(|p| target.starts_with(p))
}

/// Build a formatting layer that renders ONLY events emitted by workspace crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format
/// - `file:line` and target (module path)
/// - Span close events (duration at the end of spans)
/// - ANSI colors only when stdout is a terminal
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stdout().is_terminal();

    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .event_format(
            fmt::format()
                .compact()
                .with_timer(ChronoRfc3339Utc)
                .with_level(true)
                .with_target(true)
                .with_source_location(true)
                .with_ansi(use_ansi),
        )
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_filter(only_workspace)
}

/// Helper to build a level directive for **this** library only.
/// Example:
/// `EnvFilter::new("info").add_directive(level_directive(Level::DEBUG))`
pub fn level_directive(level: Level) -> Option<Directive> {
    // Format like `ai_llm_service=debug`
    let s = format!("{TARGET_PREFIX}={}", level.as_str().to_lowercase());
    Directive::from_str(&s).ok()
}

/// Create an EnvFilter from `RUST_LOG` or a fallback default, then apply a
/// per-crate level directive for this library.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    let base = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    match level_directive(level) {
        Some(d) => base.add_directive(d),
        None => base,
    }
}
