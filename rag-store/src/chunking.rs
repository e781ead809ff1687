//! Paragraph-aware text chunker.
//!
//! Paragraphs (`\n\n`-separated) are packed into chunks of at most
//! `size` characters. A paragraph longer than `size` is cut into windows of
//! `size` characters that overlap by `overlap` characters, preferring to end
//! a window on whitespace. Consecutive packed chunks carry the last
//! `overlap` characters of their predecessor.

use crate::config::ChunkingConfig;

/// Splits `text` into chunks. Returns an empty vector for blank input.
pub fn chunk_text(text: &str, cfg: ChunkingConfig) -> Vec<String> {
    let size = cfg.size.max(1);
    let overlap = cfg.overlap.min(size - 1);

    let mut chunks: Vec<String> = Vec::new();
    let mut buf = String::new();
    let mut buf_chars = 0usize;

    for para in text.split("\n\n") {
        let para = para.trim();
        if para.is_empty() {
            continue;
        }
        let para_chars = para.chars().count();

        if para_chars > size {
            if !buf.is_empty() {
                chunks.push(std::mem::take(&mut buf));
                buf_chars = 0;
            }
            chunks.extend(split_long(para, size, overlap));
            continue;
        }

        let would_be = if buf.is_empty() {
            para_chars
        } else {
            buf_chars + 2 + para_chars
        };
        if would_be > size && !buf.is_empty() {
            let tail = tail_chars(&buf, overlap);
            chunks.push(std::mem::take(&mut buf));
            buf_chars = 0;
            let tail_len = tail.chars().count();
            if !tail.is_empty() && tail_len + 2 + para_chars <= size {
                buf.push_str(&tail);
                buf_chars = tail_len;
            }
        }

        if !buf.is_empty() {
            buf.push_str("\n\n");
            buf_chars += 2;
        }
        buf.push_str(para);
        buf_chars += para_chars;
    }

    if !buf.is_empty() {
        chunks.push(buf);
    }
    chunks
}

/// Windows over a single oversized paragraph.
fn split_long(para: &str, size: usize, overlap: usize) -> Vec<String> {
    let chars: Vec<char> = para.chars().collect();
    let mut out = Vec::new();
    let mut start = 0usize;

    while start < chars.len() {
        let hard_end = (start + size).min(chars.len());
        let end = if hard_end < chars.len() {
            // Prefer a whitespace boundary in the second half of the window.
            (start + size / 2..hard_end)
                .rev()
                .find(|&i| chars[i].is_whitespace())
                .map(|i| i + 1)
                .unwrap_or(hard_end)
        } else {
            hard_end
        };

        let piece: String = chars[start..end].iter().collect();
        let piece = piece.trim();
        if !piece.is_empty() {
            out.push(piece.to_string());
        }
        if end >= chars.len() {
            break;
        }
        // Always advance, even when overlap would step back past `start`.
        start = end.saturating_sub(overlap).max(start + 1);
    }
    out
}

/// Last `n` characters of `s`, starting on a word boundary when possible.
fn tail_chars(s: &str, n: usize) -> String {
    if n == 0 {
        return String::new();
    }
    let total = s.chars().count();
    let skip = total.saturating_sub(n);
    let tail: String = s.chars().skip(skip).collect();
    match tail.find(char::is_whitespace) {
        Some(pos) if skip > 0 => tail[pos..].trim_start().to_string(),
        _ => tail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(size: usize, overlap: usize) -> ChunkingConfig {
        ChunkingConfig { size, overlap }
    }

    #[test]
    fn blank_text_has_no_chunks() {
        assert!(chunk_text("  \n\n  ", cfg(100, 10)).is_empty());
    }

    #[test]
    fn small_paragraphs_are_packed_together() {
        let chunks = chunk_text("alpha\n\nbeta\n\ngamma", cfg(100, 0));
        assert_eq!(chunks, vec!["alpha\n\nbeta\n\ngamma".to_string()]);
    }

    #[test]
    fn packing_respects_size() {
        let text = "aaaa aaaa\n\nbbbb bbbb\n\ncccc cccc";
        let chunks = chunk_text(text, cfg(20, 0));
        assert_eq!(chunks.len(), 2);
        assert!(chunks.iter().all(|c| c.chars().count() <= 20));
    }

    #[test]
    fn long_paragraph_is_windowed_with_overlap() {
        let words: Vec<String> = (0..60).map(|i| format!("w{i:02}")).collect();
        let para = words.join(" ");
        let chunks = chunk_text(&para, cfg(40, 8));
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.chars().count() <= 40));
        // Every word survives somewhere.
        for w in &words {
            assert!(chunks.iter().any(|c| c.contains(w.as_str())), "lost {w}");
        }
    }

    #[test]
    fn multibyte_text_does_not_panic() {
        let para = "ёжик ".repeat(100);
        let chunks = chunk_text(&para, cfg(30, 5));
        assert!(!chunks.is_empty());
    }
}
