//! `{placeholder}` substitution against envelope fields.
//!
//! - `{name}` is replaced by the field `name`; strings are inserted raw,
//!   other JSON values in their compact JSON form.
//! - `{docs}` renders the envelope documents as JSON.
//! - Anything else, including unknown names and doubled braces, is left
//!   untouched, so rendering text that holds no known placeholder is a
//!   no-op. History is re-rendered on every turn and must not drift.

use crate::envelope::{DOCS_FIELD, ResponseEnvelope};

pub fn render(template: &str, envelope: &ResponseEnvelope) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(pos) = rest.find('{') {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];

        match tail[1..].find('}') {
            Some(end) => {
                let name = &tail[1..1 + end];
                match is_identifier(name).then(|| lookup(name, envelope)).flatten() {
                    Some(value) => {
                        out.push_str(&value);
                        rest = &tail[end + 2..];
                    }
                    None => {
                        out.push('{');
                        rest = &tail[1..];
                    }
                }
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn lookup(name: &str, envelope: &ResponseEnvelope) -> Option<String> {
    if let Some(v) = envelope.get(name) {
        return Some(match v.as_str() {
            Some(s) => s.to_string(),
            None => v.to_string(),
        });
    }
    if name == DOCS_FIELD {
        return envelope
            .docs()
            .and_then(|d| serde_json::to_string(d).ok());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env() -> ResponseEnvelope {
        ResponseEnvelope::new()
            .with_field("question", "What is X?")
            .with_field("attempts", 2)
    }

    #[test]
    fn substitutes_known_fields() {
        assert_eq!(render("{question}", &env()), "What is X?");
        assert_eq!(render("tries={attempts}.", &env()), "tries=2.");
    }

    #[test]
    fn keeps_unknown_and_literal_braces() {
        assert_eq!(render("{missing} {question}", &env()), "{missing} What is X?");
        assert_eq!(render("{{}} and }}", &env()), "{{}} and }}");
        assert_eq!(render("fn f() { x }", &env()), "fn f() { x }");
        assert_eq!(render("dangling {question", &env()), "dangling {question");
    }

    #[test]
    fn rerendering_is_stable() {
        let text = "use `{{` for a literal brace, e.g. format!(\"{{}}\")";
        let once = render(text, &env());
        assert_eq!(once, text);
        assert_eq!(render(&once, &env()), text);
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(render("no braces here", &env()), "no braces here");
    }
}
