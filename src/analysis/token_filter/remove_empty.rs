//! Remove empty filter implementation.
//!
//! The last stage of the message pipeline: anything a previous filter
//! stopped or emptied is dropped here, so downstream code only ever sees
//! real terms.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::error::Result;

/// Drops empty and stopped tokens.
#[derive(Clone, Debug, Default)]
pub struct RemoveEmptyFilter;

impl RemoveEmptyFilter {
    pub fn new() -> Self {
        RemoveEmptyFilter
    }
}

impl Filter for RemoveEmptyFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(Box::new(
            tokens.filter(|token| !(token.is_stopped() || token.is_empty())),
        ))
    }

    fn name(&self) -> &'static str {
        "remove_empty"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::token::Token;

    #[test]
    fn test_remove_empty_filter() {
        let filter = RemoveEmptyFilter::new();
        let tokens = vec![
            Token::new("flood", 0),
            Token::new("", 1),
            Token::new("   ", 2).stop(),
            Token::new("shelter", 3),
        ];

        let result: Vec<String> = filter
            .filter(Box::new(tokens.into_iter()))
            .unwrap()
            .map(|t| t.text)
            .collect();

        assert_eq!(result, vec!["flood", "shelter"]);
    }
}
