//! Rewrite Detector.

/// Whether the backend answered a different question than the one asked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub rewritten: bool,
    pub question: String,
}

/// Exact comparison only: `rewritten == enabled && resolved != prompt`.
/// A missing resolved question counts as unchanged.
pub fn detect_rewrite(prompt: &str, resolved: Option<&str>, enabled: bool) -> RewriteOutcome {
    match resolved {
        Some(q) if enabled && q != prompt => RewriteOutcome {
            rewritten: true,
            question: q.to_string(),
        },
        _ => RewriteOutcome {
            rewritten: false,
            question: prompt.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_table() {
        let cases = [
            ("q", Some("q"), true, false),
            ("q", Some("q2"), true, true),
            ("q", Some("q2"), false, false),
            ("q", None, true, false),
            ("Q", Some("q"), true, true),
            ("q ", Some("q"), true, true),
        ];
        for (prompt, resolved, flag, expect) in cases {
            let out = detect_rewrite(prompt, resolved, flag);
            assert_eq!(out.rewritten, expect, "{prompt:?} {resolved:?} {flag}");
            if out.rewritten {
                assert_ne!(out.question, prompt);
            } else {
                assert_eq!(out.question, prompt);
            }
        }
    }
}
