//! TF-IDF lexical indexing over a corpus snapshot.
//!
//! A [`LexicalModel`] is fitted over one corpus generation and immutable
//! afterwards; the orchestrator swaps in a replacement wholesale on reindex.
//! The vocabulary covers unigrams and adjacent-pair bigrams, minus stop
//! words, capped at a configurable term count. Vectorizing text with
//! out-of-vocabulary terms yields zero weight for those terms, never an
//! error.
//!
//! Refitting is O(corpus size × average document length); vectorizing a
//! query touches only the query's own terms.

use itertools::Itertools;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::LazyLock;

/// Common English stop words excluded from the vocabulary.
static STOP_WORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "about", "after", "all", "also", "an", "and", "any", "are", "as", "at", "be", "because",
        "been", "before", "but", "by", "can", "could", "did", "do", "does", "for", "from", "had",
        "has", "have", "he", "her", "here", "him", "his", "how", "if", "in", "into", "is", "it",
        "its", "just", "me", "more", "most", "my", "no", "not", "now", "of", "on", "only", "or",
        "other", "our", "out", "over", "she", "so", "some", "such", "than", "that", "the", "their",
        "them", "then", "there", "these", "they", "this", "those", "through", "to", "under", "up",
        "very", "was", "we", "were", "what", "when", "where", "which", "while", "who", "why",
        "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, split on non-alphanumeric, drop single characters and stop
/// words.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.chars().count() > 1 && !STOP_WORDS.contains(token))
        .map(str::to_owned)
        .collect()
}

/// Unigrams plus adjacent-pair bigrams for a text.
fn terms(text: &str) -> Vec<String> {
    let tokens = tokenize(text);
    let bigrams: Vec<String> = tokens
        .iter()
        .tuple_windows()
        .map(|(a, b)| format!("{a} {b}"))
        .collect();
    let mut terms = tokens;
    terms.extend(bigrams);
    terms
}

/// Sparse weighted term vector keyed by vocabulary dimension.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SparseVector {
    weights: BTreeMap<usize, f32>,
}

impl SparseVector {
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    /// Build an L2-normalized TF-IDF vector from raw term counts.
    fn from_counts(counts: &HashMap<usize, usize>, idf: &[f32]) -> Self {
        let mut weights: BTreeMap<usize, f32> = counts
            .iter()
            .map(|(&index, &count)| (index, count as f32 * idf[index]))
            .collect();
        let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
        if norm > 0.0 {
            for weight in weights.values_mut() {
                *weight /= norm;
            }
        }
        Self { weights }
    }

    /// Cosine similarity in [0, 1]; 0 when either vector is empty.
    pub fn cosine(&self, other: &SparseVector) -> f32 {
        if self.is_empty() || other.is_empty() {
            return 0.0;
        }
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let dot: f32 = small
            .weights
            .iter()
            .filter_map(|(index, weight)| large.weights.get(index).map(|w| weight * w))
            .sum();
        if dot == 0.0 {
            return 0.0;
        }
        let norms = self.norm() * other.norm();
        if norms == 0.0 {
            0.0
        } else {
            (dot / norms).min(1.0)
        }
    }

    fn norm(&self) -> f32 {
        self.weights.values().map(|w| w * w).sum::<f32>().sqrt()
    }
}

/// A fitted term-vocabulary over one specific corpus snapshot.
///
/// Valid only against the snapshot it was fitted on; the orchestrator
/// replaces it atomically whenever the corpus changes.
pub struct LexicalModel {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f32>,
    doc_vectors: HashMap<String, SparseVector>,
    doc_count: usize,
    fitted_at: i64,
}

impl LexicalModel {
    /// Fit a model over `(id, text)` pairs.
    ///
    /// Returns `None` when there are no documents or no indexable terms:
    /// the explicit no-model state, not an error.
    pub fn fit<I, A, B>(docs: I, max_terms: usize) -> Option<Self>
    where
        I: IntoIterator<Item = (A, B)>,
        A: AsRef<str>,
        B: AsRef<str>,
    {
        let docs: Vec<(String, Vec<String>)> = docs
            .into_iter()
            .map(|(id, text)| (id.as_ref().to_owned(), terms(text.as_ref())))
            .collect();
        if docs.is_empty() {
            return None;
        }

        let mut df: HashMap<&str, usize> = HashMap::new();
        for (_, doc_terms) in &docs {
            let unique: HashSet<&str> = doc_terms.iter().map(String::as_str).collect();
            for term in unique {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        // Keep the most document-frequent terms; ties break alphabetically
        // so refitting the same corpus lands on the same vocabulary.
        let mut ranked: Vec<(&str, usize)> = df.iter().map(|(&term, &count)| (term, count)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked.truncate(max_terms);
        ranked.sort_by(|a, b| a.0.cmp(b.0));
        if ranked.is_empty() {
            return None;
        }

        let doc_count = docs.len();
        let mut vocabulary = HashMap::with_capacity(ranked.len());
        let mut idf = Vec::with_capacity(ranked.len());
        for (index, (term, frequency)) in ranked.iter().enumerate() {
            vocabulary.insert((*term).to_owned(), index);
            idf.push(((1.0 + doc_count as f32) / (1.0 + *frequency as f32)).ln() + 1.0);
        }

        let doc_vectors = docs
            .iter()
            .map(|(id, doc_terms)| {
                let counts = count_known(doc_terms, &vocabulary);
                (id.clone(), SparseVector::from_counts(&counts, &idf))
            })
            .collect();

        Some(Self {
            vocabulary,
            idf,
            doc_vectors,
            doc_count,
            fitted_at: chrono::Utc::now().timestamp(),
        })
    }

    /// Sparse vector for arbitrary text under this vocabulary. Unknown
    /// terms contribute nothing.
    pub fn vectorize(&self, text: &str) -> SparseVector {
        let counts = count_known(&terms(text), &self.vocabulary);
        SparseVector::from_counts(&counts, &self.idf)
    }

    /// The fitted vector for an indexed document, if it was part of this
    /// snapshot.
    pub fn document_vector(&self, id: &str) -> Option<&SparseVector> {
        self.doc_vectors.get(id)
    }

    pub fn document_count(&self) -> usize {
        self.doc_count
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Unix timestamp of when this snapshot was fitted.
    pub fn fitted_at(&self) -> i64 {
        self.fitted_at
    }
}

fn count_known(
    doc_terms: &[String],
    vocabulary: &HashMap<String, usize>,
) -> HashMap<usize, usize> {
    let mut counts = HashMap::new();
    for term in doc_terms {
        if let Some(&index) = vocabulary.get(term) {
            *counts.entry(index).or_insert(0) += 1;
        }
    }
    counts
}
