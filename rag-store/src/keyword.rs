//! In-memory BM25 keyword index.
//!
//! The index is immutable once built. It has no delete operation: after a
//! document is removed the whole index is rebuilt from the document
//! directory and swapped in by the owner.

use std::collections::HashMap;

/// BM25 term-frequency saturation.
pub const BM25_K1: f64 = 1.2;
/// BM25 length normalisation.
pub const BM25_B: f64 = 0.75;

/// One indexed unit (a chunk of a document).
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordDoc {
    pub source: String,
    pub text: String,
}

/// Keyword search hit, best first.
#[derive(Clone, Debug, PartialEq)]
pub struct KeywordHit {
    pub score: f64,
    pub source: String,
    pub text: String,
}

#[derive(Debug, Default)]
pub struct KeywordIndex {
    docs: Vec<KeywordDoc>,
    doc_lens: Vec<usize>,
    avg_len: f64,
    /// term -> postings of (doc index, term frequency)
    postings: HashMap<String, Vec<(usize, u32)>>,
}

impl KeywordIndex {
    /// An index with no documents; every search returns nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn build(docs: Vec<KeywordDoc>) -> Self {
        let mut postings: HashMap<String, Vec<(usize, u32)>> = HashMap::new();
        let mut doc_lens = Vec::with_capacity(docs.len());

        for (i, doc) in docs.iter().enumerate() {
            let tokens = tokenize(&doc.text);
            doc_lens.push(tokens.len());
            let mut tf: HashMap<String, u32> = HashMap::new();
            for t in tokens {
                *tf.entry(t).or_default() += 1;
            }
            for (term, n) in tf {
                postings.entry(term).or_default().push((i, n));
            }
        }

        let total: usize = doc_lens.iter().sum();
        let avg_len = if docs.is_empty() {
            0.0
        } else {
            total as f64 / docs.len() as f64
        };

        Self {
            docs,
            doc_lens,
            avg_len,
            postings,
        }
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }

    /// Top-`k` documents for `query`. Documents sharing no term with the
    /// query are never returned.
    pub fn search(&self, query: &str, k: usize) -> Vec<KeywordHit> {
        if self.docs.is_empty() || k == 0 {
            return Vec::new();
        }
        let n = self.docs.len() as f64;
        let mut scores: HashMap<usize, f64> = HashMap::new();

        let mut terms = tokenize(query);
        terms.sort();
        terms.dedup();

        for term in &terms {
            let Some(list) = self.postings.get(term) else {
                continue;
            };
            let df = list.len() as f64;
            let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
            for &(doc, tf) in list {
                let tf = tf as f64;
                let len_norm = if self.avg_len > 0.0 {
                    self.doc_lens[doc] as f64 / self.avg_len
                } else {
                    1.0
                };
                let denom = tf + BM25_K1 * (1.0 - BM25_B + BM25_B * len_norm);
                *scores.entry(doc).or_default() += idf * (tf * (BM25_K1 + 1.0)) / denom;
            }
        }

        let mut ranked: Vec<(usize, f64)> = scores.into_iter().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);

        ranked
            .into_iter()
            .map(|(i, score)| KeywordHit {
                score,
                source: self.docs[i].source.clone(),
                text: self.docs[i].text.clone(),
            })
            .collect()
    }
}

/// Lowercased alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(source: &str, text: &str) -> KeywordDoc {
        KeywordDoc {
            source: source.into(),
            text: text.into(),
        }
    }

    #[test]
    fn ranks_matching_documents_first() {
        let idx = KeywordIndex::build(vec![
            doc("a", "the cat sat on the mat"),
            doc("b", "dogs chase cats"),
            doc("c", "quantum chromodynamics of the cat cat cat"),
        ]);
        let hits = idx.search("cat", 10);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source, "c");
        assert!(hits.iter().all(|h| h.source != "b"));
    }

    #[test]
    fn empty_index_and_zero_k() {
        assert!(KeywordIndex::empty().search("x", 5).is_empty());
        let idx = KeywordIndex::build(vec![doc("a", "x")]);
        assert!(idx.search("x", 0).is_empty());
        assert!(idx.search("unrelated", 5).is_empty());
    }

    #[test]
    fn tokenizer_lowercases_and_splits() {
        assert_eq!(tokenize("Hello, World-42!"), vec!["hello", "world", "42"]);
    }
}
