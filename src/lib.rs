//! # Triage
//!
//! Multi-label classification of disaster-response messages.
//!
//! ## Features
//!
//! - Data preparation: join raw message and category tables, binarize and
//!   de-duplicate
//! - Text analysis pipeline with URL masking and English lemmatization
//! - Sparse TF-IDF features over word n-grams
//! - One random forest per category
//! - Grid search with k-fold cross-validation on a rayon pool
//! - Per-category evaluation reports
//! - Checksummed model files

pub mod analysis;
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod ml;

pub mod prelude {
    pub use crate::analysis::{Analyzer, AnalyzerConfig, MessageAnalyzer};
    pub use crate::config::TrainingConfig;
    pub use crate::corpus::{CategorySet, Dataset, LabelMatrix, Message};
    pub use crate::error::{Result, TriageError};
    pub use crate::features::{TfidfVectorizer, VectorizerConfig};
    pub use crate::ml::{
        EvaluationReport, ForestConfig, GridSearch, MultiOutputClassifier, SearchConfig,
        TextPipeline, evaluate, train_pipeline,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
