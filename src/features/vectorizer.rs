//! TF-IDF vectorizer over analyzed token sequences.
//!
//! The vectorizer works on tokens rather than raw text so that a corpus can
//! be analyzed once and vectorized under many configurations.
//!
//! # Weighting
//!
//! For a term `t` in document `d` over a training corpus of `n` documents:
//!
//! ```text
//! tf(t, d)  = raw count of t in d
//! idf(t)    = ln((1 + n) / (1 + df(t))) + 1        (use_idf = true)
//! w(t, d)   = tf(t, d) * idf(t)                     (or tf alone)
//! ```
//!
//! Each row is then scaled to unit Euclidean norm.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::features::sparse::{SparseMatrix, SparseRow};

/// Configuration of the [`TfidfVectorizer`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizerConfig {
    /// Smallest and largest n-gram length. `(1, 2)` counts unigrams and
    /// bigrams.
    pub ngram_range: (usize, usize),
    /// Drop terms present in more than this fraction of training documents.
    pub max_df: f64,
    /// Keep only the most frequent terms.
    pub max_features: Option<usize>,
    /// Re-weight counts by inverse document frequency.
    pub use_idf: bool,
}

impl Default for VectorizerConfig {
    fn default() -> Self {
        Self {
            ngram_range: (1, 1),
            max_df: 1.0,
            max_features: None,
            use_idf: true,
        }
    }
}

impl VectorizerConfig {
    pub fn validate(&self) -> Result<()> {
        let (min_n, max_n) = self.ngram_range;
        if min_n == 0 || min_n > max_n {
            return Err(TriageError::invalid_config(format!(
                "ngram_range must satisfy 1 <= min <= max, got ({min_n}, {max_n})"
            )));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(TriageError::invalid_config(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.max_features == Some(0) {
            return Err(TriageError::invalid_config("max_features must be positive"));
        }
        Ok(())
    }
}

/// Converts token sequences into L2-normalized TF-IDF rows.
///
/// The vocabulary is learned by [`fit`](Self::fit) from the training corpus
/// only and stays frozen until the next fit. Its columns are sorted
/// lexicographically.
#[derive(Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: VectorizerConfig,
    vocabulary: Vec<String>,
    idf: Vec<f64>,
    n_documents: usize,
}

impl std::fmt::Debug for TfidfVectorizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfidfVectorizer")
            .field("config", &self.config)
            .field("vocabulary_size", &self.vocabulary.len())
            .field("n_documents", &self.n_documents)
            .finish()
    }
}

impl TfidfVectorizer {
    /// Create an unfitted vectorizer.
    pub fn new(config: VectorizerConfig) -> Result<Self> {
        config.validate()?;
        Ok(TfidfVectorizer {
            config,
            vocabulary: Vec::new(),
            idf: Vec::new(),
            n_documents: 0,
        })
    }

    pub fn config(&self) -> &VectorizerConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        !self.vocabulary.is_empty()
    }

    /// Learn the vocabulary and document frequencies. Replaces any previous
    /// fit.
    pub fn fit<D: AsRef<[String]>>(&mut self, documents: &[D]) -> Result<()> {
        if documents.is_empty() {
            return Err(TriageError::invalid_argument(
                "cannot fit a vectorizer on an empty corpus",
            ));
        }

        let n = documents.len();
        let mut document_frequency: AHashMap<String, usize> = AHashMap::new();
        let mut total_count: AHashMap<String, usize> = AHashMap::new();

        for doc in documents {
            for (term, count) in self.count_terms(doc.as_ref()) {
                *total_count.entry(term.clone()).or_insert(0) += count;
                *document_frequency.entry(term).or_insert(0) += 1;
            }
        }

        let max_doc_count = self.config.max_df * n as f64;
        let mut terms: Vec<(String, usize)> = total_count
            .into_iter()
            .filter(|(term, _)| {
                document_frequency.get(term).copied().unwrap_or(0) as f64 <= max_doc_count
            })
            .collect();

        if let Some(limit) = self.config.max_features {
            terms.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
            terms.truncate(limit);
        }

        let mut vocabulary: Vec<String> = terms.into_iter().map(|(term, _)| term).collect();
        vocabulary.sort_unstable();

        if vocabulary.is_empty() {
            return Err(TriageError::invalid_argument(
                "corpus produced an empty vocabulary",
            ));
        }

        self.idf = vocabulary
            .iter()
            .map(|term| {
                let df = document_frequency.get(term).copied().unwrap_or(0) as f64;
                ((1.0 + n as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        self.vocabulary = vocabulary;
        self.n_documents = n;

        log::debug!(
            "Fitted vectorizer on {n} documents: {} terms",
            self.vocabulary.len()
        );
        Ok(())
    }

    /// Weight documents against the fitted vocabulary. Terms outside the
    /// vocabulary are ignored.
    pub fn transform<D: AsRef<[String]>>(&self, documents: &[D]) -> Result<SparseMatrix> {
        if !self.is_fitted() {
            return Err(TriageError::not_fitted(
                "vectorizer must be fitted before transform",
            ));
        }

        let rows = documents
            .iter()
            .map(|doc| self.transform_one(doc.as_ref()))
            .collect();
        SparseMatrix::from_rows(rows, self.vocabulary.len())
    }

    /// Fit, then transform the same documents.
    pub fn fit_transform<D: AsRef<[String]>>(&mut self, documents: &[D]) -> Result<SparseMatrix> {
        self.fit(documents)?;
        self.transform(documents)
    }

    fn transform_one(&self, tokens: &[String]) -> SparseRow {
        let pairs = self.count_terms(tokens).into_iter().filter_map(|(term, count)| {
            let col = self.feature_index(&term)?;
            let weight = if self.config.use_idf {
                count as f64 * self.idf[col]
            } else {
                count as f64
            };
            Some((col, weight))
        });

        let mut row = SparseRow::from_pairs(pairs);
        row.l2_normalize();
        row
    }

    fn count_terms(&self, tokens: &[String]) -> AHashMap<String, usize> {
        let mut counts = AHashMap::new();
        let (min_n, max_n) = self.config.ngram_range;
        for n in min_n..=max_n {
            for gram in ngrams(tokens, n) {
                *counts.entry(gram).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Column of a term, if it is in the vocabulary.
    pub fn feature_index(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|entry| entry.as_str().cmp(term))
            .ok()
    }

    /// Vocabulary terms in column order.
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// IDF weight of every column.
    pub fn idf(&self) -> &[f64] {
        &self.idf
    }

    /// Number of documents seen by the last fit.
    pub fn n_documents(&self) -> usize {
        self.n_documents
    }
}

/// N-grams of length `n`, joined with a single space.
pub fn ngrams(tokens: &[String], n: usize) -> impl Iterator<Item = String> + '_ {
    let tokens = if n == 0 { &tokens[..0] } else { tokens };
    tokens.windows(n.max(1)).map(|window| window.join(" "))
}
