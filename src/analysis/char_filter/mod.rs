//! Char filter implementations for text normalization.
//!
//! Char filters rewrite the raw message string before it reaches the
//! tokenizer.
//!
//! # Available Filters
//!
//! - [`pattern_replace::PatternReplaceCharFilter`] - Regex-based replacement,
//!   including the URL placeholder filter
//! - [`punctuation::PunctuationCharFilter`] - ASCII punctuation removal

/// Trait for character filters that transform text before tokenization.
pub trait CharFilter: Send + Sync {
    /// Apply this filter to the input text.
    fn filter(&self, input: &str) -> String;

    /// Get the name of this char filter.
    fn name(&self) -> &'static str;
}

pub mod pattern_replace;
pub mod punctuation;

pub use pattern_replace::PatternReplaceCharFilter;
pub use punctuation::PunctuationCharFilter;
