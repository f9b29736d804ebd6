//! Analyzer implementations that combine tokenizers and filters.

mod analyzer;
mod message;
mod pipeline;

pub use analyzer::Analyzer;
pub use message::{AnalyzerConfig, DEFAULT_URL_PLACEHOLDER, MessageAnalyzer};
pub use pipeline::PipelineAnalyzer;
