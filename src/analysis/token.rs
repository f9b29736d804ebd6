//! Terms in flight through the analysis chain.
//!
//! The tokenizer cuts a message into [`Token`]s, filters rewrite their text
//! or mark them stopped, and the final filter drops whatever was stopped.
//!
//! ```
//! use triage::analysis::token::{Token, TokenKind};
//!
//! let text = "need water";
//! let token = Token::new("water", 1).spanning(5..10).of_kind(TokenKind::Word);
//! assert_eq!(&text[token.span.clone()], token.text);
//! assert!(!token.is_stopped());
//! ```

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Coarse classification assigned by the tokenizer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// Contains at least one letter.
    Word,
    /// Digits only.
    Number,
    /// A marker substituted by a char filter, such as the URL placeholder.
    Placeholder,
    #[default]
    Other,
}

/// One term of an analyzed message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    /// Index among the tokens the tokenizer emitted.
    pub position: usize,
    /// Byte range in the filtered message text.
    pub span: Range<usize>,
    pub kind: TokenKind,
    /// Set by filters; stopped tokens are skipped by later filters and
    /// dropped at the end of the chain.
    pub stopped: bool,
}

impl Token {
    pub fn new<S: Into<String>>(text: S, position: usize) -> Self {
        Token {
            text: text.into(),
            position,
            span: 0..0,
            kind: TokenKind::Other,
            stopped: false,
        }
    }

    pub fn spanning(mut self, span: Range<usize>) -> Self {
        self.span = span;
        self
    }

    pub fn of_kind(mut self, kind: TokenKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the token as stopped.
    pub fn stop(mut self) -> Self {
        self.stopped = true;
        self
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    pub fn is_placeholder(&self) -> bool {
        self.kind == TokenKind::Placeholder
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Lazy sequence of tokens passed between analysis stages.
pub type TokenStream = Box<dyn Iterator<Item = Token>>;
