//! The analyzer trait.

use crate::analysis::token::TokenStream;
use crate::error::Result;

/// Turns a message into tokens.
///
/// Implementations are shared by the workers of a parallel fit, hence the
/// `Send + Sync` bound.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Result<TokenStream>;

    fn name(&self) -> &'static str;

    /// Texts of the surviving tokens, in order.
    fn terms(&self, text: &str) -> Result<Vec<String>> {
        Ok(self.analyze(text)?.map(|token| token.text).collect())
    }
}
