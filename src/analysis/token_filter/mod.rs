//! Token filter implementations for token transformation.
//!
//! # Available Filters
//!
//! - [`lowercase::LowercaseFilter`] - Converts tokens to lowercase
//! - [`lemma::LemmaFilter`] - Reduces inflected words to their lemma
//! - [`strip::StripFilter`] - Trims surrounding whitespace
//! - [`remove_empty::RemoveEmptyFilter`] - Drops empty and stopped tokens

use crate::analysis::token::{Token, TokenStream};
use crate::error::Result;

/// Trait for filters that transform token streams.
pub trait Filter: Send + Sync {
    /// Apply this filter to a token stream.
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream>;

    /// Get the name of this filter (for debugging and configuration).
    fn name(&self) -> &'static str;
}

/// Lazily apply `rewrite` to every token that is not stopped.
pub(crate) fn rewrite_live<F>(tokens: TokenStream, rewrite: F) -> TokenStream
where
    F: Fn(Token) -> Token + 'static,
{
    Box::new(tokens.map(move |token| {
        if token.is_stopped() {
            token
        } else {
            rewrite(token)
        }
    }))
}

pub mod lemma;
pub mod lowercase;
pub mod remove_empty;
pub mod strip;

pub use lemma::{EnglishLemmatizer, LemmaFilter, Lemmatizer};
pub use lowercase::LowercaseFilter;
pub use remove_empty::RemoveEmptyFilter;
pub use strip::StripFilter;
