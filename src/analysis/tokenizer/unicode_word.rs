//! Word tokenizer based on Unicode segmentation (UAX #29).
//!
//! Contractions such as `don't` stay a single segment; segments with no
//! alphanumeric character are skipped.
//!
//! ```
//! use triage::analysis::tokenizer::Tokenizer;
//! use triage::analysis::tokenizer::unicode_word::UnicodeWordTokenizer;
//!
//! let tokenizer = UnicodeWordTokenizer::new();
//! let words: Vec<String> = tokenizer
//!     .tokenize("We need water, please!")
//!     .unwrap()
//!     .map(|t| t.text)
//!     .collect();
//!
//! assert_eq!(words, ["We", "need", "water", "please"]);
//! ```

use unicode_segmentation::UnicodeSegmentation;

use crate::analysis::token::{Token, TokenKind, TokenStream};
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

#[derive(Clone, Debug, Default)]
pub struct UnicodeWordTokenizer {
    placeholders: Vec<String>,
}

impl UnicodeWordTokenizer {
    pub fn new() -> Self {
        UnicodeWordTokenizer::default()
    }

    /// Tag `word` as [`TokenKind::Placeholder`] wherever it occurs.
    pub fn with_placeholder<S: Into<String>>(mut self, word: S) -> Self {
        self.placeholders.push(word.into());
        self
    }

    fn classify(&self, word: &str) -> TokenKind {
        if self.placeholders.iter().any(|p| p == word) {
            TokenKind::Placeholder
        } else if word.chars().any(char::is_alphabetic) {
            TokenKind::Word
        } else if word.chars().all(char::is_numeric) {
            TokenKind::Number
        } else {
            TokenKind::Other
        }
    }
}

impl Tokenizer for UnicodeWordTokenizer {
    fn tokenize(&self, text: &str) -> Result<TokenStream> {
        let mut tokens = Vec::new();
        for (start, word) in text.split_word_bound_indices() {
            if !word.chars().any(char::is_alphanumeric) {
                continue;
            }
            let token = Token::new(word, tokens.len())
                .spanning(start..start + word.len())
                .of_kind(self.classify(word));
            tokens.push(token);
        }
        Ok(Box::new(tokens.into_iter()))
    }

    fn name(&self) -> &'static str {
        "unicode_word"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(tokenizer: &UnicodeWordTokenizer, text: &str) -> Vec<Token> {
        tokenizer.tokenize(text).unwrap().collect()
    }

    #[test]
    fn test_positions_and_spans() {
        let text = "Flooding in Leogane, send boats";
        let tokens = tokenize(&UnicodeWordTokenizer::new(), text);

        let words: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(words, ["Flooding", "in", "Leogane", "send", "boats"]);
        assert_eq!(tokens[3].position, 3);
        for token in &tokens {
            assert_eq!(&text[token.span.clone()], token.text);
        }
    }

    #[test]
    fn test_contraction() {
        let tokens = tokenize(&UnicodeWordTokenizer::new(), "they can't reach us");
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[1].text, "can't");
    }

    #[test]
    fn test_kinds() {
        let tokenizer = UnicodeWordTokenizer::new().with_placeholder("urlplaceholder");
        let kinds: Vec<TokenKind> = tokenize(&tokenizer, "see urlplaceholder 2010 3rd")
            .into_iter()
            .map(|t| t.kind)
            .collect();

        assert_eq!(
            kinds,
            [
                TokenKind::Word,
                TokenKind::Placeholder,
                TokenKind::Number,
                TokenKind::Word
            ]
        );
    }

    #[test]
    fn test_blank_input() {
        let tokenizer = UnicodeWordTokenizer::new();
        assert!(tokenize(&tokenizer, "").is_empty());
        assert!(tokenize(&tokenizer, " \t\n ... !").is_empty());
    }
}
