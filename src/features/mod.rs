//! Feature extraction: sparse matrices and TF-IDF weighting.

pub mod sparse;
pub mod vectorizer;

pub use sparse::{SparseMatrix, SparseRow};
pub use vectorizer::{TfidfVectorizer, VectorizerConfig, ngrams};
