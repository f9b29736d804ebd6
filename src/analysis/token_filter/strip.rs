//! Whitespace trimming.

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{Filter, rewrite_live};
use crate::error::Result;

/// Trims surrounding whitespace and stops tokens that end up blank.
#[derive(Clone, Debug, Default)]
pub struct StripFilter;

impl StripFilter {
    pub fn new() -> Self {
        StripFilter
    }
}

impl Filter for StripFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(rewrite_live(tokens, |mut token| {
            let trimmed = token.text.trim();
            if trimmed.is_empty() {
                return token.stop();
            }
            if trimmed.len() != token.text.len() {
                token.text = trimmed.to_string();
            }
            token
        }))
    }

    fn name(&self) -> &'static str {
        "strip"
    }
}
