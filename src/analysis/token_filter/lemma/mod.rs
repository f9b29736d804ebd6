//! Lemmatizing token filter and lemmatizer implementations.

use std::sync::Arc;

use super::{Filter, rewrite_live};
use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Trait for algorithms that reduce an inflected word to its base form.
pub trait Lemmatizer: Send + Sync {
    /// Return the lemma of `word`. Must never return an empty string for a
    /// non-empty input.
    fn lemmatize(&self, word: &str) -> String;

    /// Get the name of this lemmatizer.
    fn name(&self) -> &'static str;
}

pub mod english;

pub use english::EnglishLemmatizer;

/// Filter that replaces each token with its lemma.
///
/// Stopped tokens and placeholder tokens are left untouched.
pub struct LemmaFilter {
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl std::fmt::Debug for LemmaFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LemmaFilter")
            .field("lemmatizer", &self.lemmatizer.name())
            .finish()
    }
}

impl LemmaFilter {
    /// Create a new lemma filter with the English lemmatizer.
    pub fn new() -> Self {
        LemmaFilter {
            lemmatizer: Arc::new(EnglishLemmatizer::new()),
        }
    }

    /// Create a lemma filter with a custom lemmatizer.
    pub fn with_lemmatizer(lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        LemmaFilter { lemmatizer }
    }
}

impl Default for LemmaFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl Filter for LemmaFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        let lemmatizer = Arc::clone(&self.lemmatizer);
        Ok(rewrite_live(tokens, move |mut token| {
            if !token.is_placeholder() {
                token.text = lemmatizer.lemmatize(&token.text);
            }
            token
        }))
    }

    fn name(&self) -> &'static str {
        "lemma"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::{Token, TokenKind};

    #[test]
    fn test_lemma_filter() {
        let filter = LemmaFilter::new();
        let tokens = vec![
            Token::new("tents", 0),
            Token::new("children", 1),
            Token::new("urlplaceholders", 2).of_kind(TokenKind::Placeholder),
            Token::new("blankets", 3).stop(),
        ];

        let result: Vec<Token> = filter.filter(Box::new(tokens.into_iter())).unwrap().collect();

        assert_eq!(result[0].text, "tent");
        assert_eq!(result[1].text, "child");
        assert_eq!(result[2].text, "urlplaceholders");
        assert_eq!(result[3].text, "blankets");
    }

    #[test]
    fn test_filter_name() {
        assert_eq!(LemmaFilter::new().name(), "lemma");
    }
}
