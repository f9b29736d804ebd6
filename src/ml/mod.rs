//! Classification models, their evaluation and hyperparameter search.
//!
//! Models here consume [`SparseMatrix`](crate::features::SparseMatrix)
//! features and 0/1 [`LabelMatrix`](crate::corpus::LabelMatrix) targets.
//! [`TextPipeline`] ties them to the analyzer and vectorizer.

pub mod artifact;
pub mod forest;
pub mod metrics;
pub mod multi_output;
pub mod pipeline;
pub mod search;
pub mod tree;

pub use forest::{ForestConfig, MaxFeatures, RandomForest};
pub use metrics::{CategoryReport, ClassMetrics, EvaluationReport, evaluate};
pub use multi_output::{LabelModel, MultiOutputClassifier};
pub use pipeline::{ModelMetadata, TextPipeline};
pub use search::{
    Candidate, CandidateScore, GridSearch, ParamGrid, ScoringMetric, SearchConfig, SearchReport,
    train_pipeline,
};
pub use tree::{DecisionTree, TreeParams};
