//! Query relevance via TF-IDF cosine similarity.
//!
//! The corpus is exactly the batch being ranked, so relevance is always
//! relative to the current search. The query itself never contributes to
//! document frequencies.

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;

/// Tokens are runs of two or more word characters
static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b\w\w+\b").expect("Invalid token regex pattern")
});

/// Score assigned to every product when the batch vocabulary is too small
/// to discriminate
pub const FAIL_OPEN_RELEVANCE: f64 = 1.0;

/// Minimum distinct terms needed before TF-IDF is meaningful
const MIN_VOCABULARY: usize = 2;

/// Lowercased tokens of `text`
pub fn tokenize(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    TOKEN_RE
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Vocabulary and smoothed inverse document frequencies for one batch
#[derive(Debug, Clone)]
pub struct TfIdf {
    idf: HashMap<String, f64>,
}

impl TfIdf {
    /// Fit on tokenized documents
    ///
    /// `idf(t) = ln((1 + n) / (1 + df(t))) + 1`
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in documents {
            let mut seen: Vec<&str> = doc.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let n = documents.len() as f64;
        let idf = df
            .into_iter()
            .map(|(term, count)| {
                let weight = ((1.0 + n) / (1.0 + count as f64)).ln() + 1.0;
                (term.to_string(), weight)
            })
            .collect();

        Self { idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// L2-normalized TF-IDF vector; out-of-vocabulary terms are ignored
    ///
    /// Ordered by term so sums are reproducible bit for bit.
    pub fn vectorize(&self, tokens: &[String]) -> BTreeMap<String, f64> {
        let mut vector: BTreeMap<String, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(idf) = self.idf.get(token) {
                *vector.entry(token.clone()).or_insert(0.0) += idf;
            }
        }

        let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for weight in vector.values_mut() {
                *weight /= norm;
            }
        }
        vector
    }
}

/// Cosine similarity of two L2-normalized sparse vectors
fn cosine(a: &BTreeMap<String, f64>, b: &BTreeMap<String, f64>) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}

/// Relevance in [0, 1] of each description to the query
///
/// Fails open: when the batch has fewer than two distinct terms every
/// product scores `FAIL_OPEN_RELEVANCE`, so relevance drops out of the
/// ranking instead of breaking it.
pub fn relevance_scores<S: AsRef<str>>(query: &str, descriptions: &[S]) -> Vec<f64> {
    let documents: Vec<Vec<String>> = descriptions
        .iter()
        .map(|d| tokenize(d.as_ref()))
        .collect();

    let model = TfIdf::fit(&documents);
    if model.vocabulary_len() < MIN_VOCABULARY {
        tracing::debug!(
            vocabulary = model.vocabulary_len(),
            "vocabulary too small for TF-IDF, relevance fails open"
        );
        return vec![FAIL_OPEN_RELEVANCE; descriptions.len()];
    }

    let query_vector = model.vectorize(&tokenize(query));
    documents
        .iter()
        .map(|doc| cosine(&model.vectorize(doc), &query_vector).clamp(0.0, 1.0))
        .collect()
}
