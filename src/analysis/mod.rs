//! Text analysis for message bodies.
//!
//! Turns raw message text into the ordered list of normalized terms the
//! vectorizer counts: char filters rewrite the string, a tokenizer splits it
//! and token filters normalize each token.

pub mod analyzer;
pub mod char_filter;
pub mod token;
pub mod token_filter;
pub mod tokenizer;

pub use analyzer::{Analyzer, AnalyzerConfig, MessageAnalyzer, PipelineAnalyzer};
pub use token::{Token, TokenKind, TokenStream};
