//! Case folding.
//!
//! ```
//! use triage::analysis::token::Token;
//! use triage::analysis::token_filter::Filter;
//! use triage::analysis::token_filter::lowercase::LowercaseFilter;
//!
//! let tokens = vec![Token::new("Earthquake", 0), Token::new("HAITI", 1)];
//! let folded: Vec<String> = LowercaseFilter::new()
//!     .filter(Box::new(tokens.into_iter()))
//!     .unwrap()
//!     .map(|t| t.text)
//!     .collect();
//!
//! assert_eq!(folded, ["earthquake", "haiti"]);
//! ```

use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{Filter, rewrite_live};
use crate::error::Result;

/// Lowercases every live token; ASCII text avoids the Unicode tables.
#[derive(Clone, Debug, Default)]
pub struct LowercaseFilter;

impl LowercaseFilter {
    pub fn new() -> Self {
        LowercaseFilter
    }
}

fn fold(text: &str) -> String {
    if text.is_ascii() {
        text.to_ascii_lowercase()
    } else {
        text.to_lowercase()
    }
}

impl Filter for LowercaseFilter {
    fn filter(&self, tokens: TokenStream) -> Result<TokenStream> {
        Ok(rewrite_live(tokens, |mut token| {
            token.text = fold(&token.text);
            token
        }))
    }

    fn name(&self) -> &'static str {
        "lowercase"
    }
}
