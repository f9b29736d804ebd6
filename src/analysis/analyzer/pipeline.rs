//! Analyzer assembled from interchangeable stages.
//!
//! ```text
//! text → char filters (in order) → tokenizer → token filters (in order)
//! ```
//!
//! ```
//! use std::sync::Arc;
//! use triage::analysis::analyzer::{Analyzer, PipelineAnalyzer};
//! use triage::analysis::token_filter::LowercaseFilter;
//! use triage::analysis::tokenizer::UnicodeWordTokenizer;
//!
//! let analyzer = PipelineAnalyzer::new(Arc::new(UnicodeWordTokenizer::new()))
//!     .with_filter(Arc::new(LowercaseFilter::new()));
//!
//! assert_eq!(analyzer.terms("Need WATER").unwrap(), ["need", "water"]);
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::char_filter::CharFilter;
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::Filter;
use crate::analysis::tokenizer::Tokenizer;
use crate::error::Result;

/// Char filters, one tokenizer and token filters, shared cheaply between
/// threads.
#[derive(Clone)]
pub struct PipelineAnalyzer {
    char_filters: Vec<Arc<dyn CharFilter>>,
    tokenizer: Arc<dyn Tokenizer>,
    filters: Vec<Arc<dyn Filter>>,
}

impl PipelineAnalyzer {
    pub fn new(tokenizer: Arc<dyn Tokenizer>) -> Self {
        PipelineAnalyzer {
            char_filters: Vec::new(),
            tokenizer,
            filters: Vec::new(),
        }
    }

    /// Append a char filter; char filters run in insertion order.
    pub fn with_char_filter(mut self, char_filter: Arc<dyn CharFilter>) -> Self {
        self.char_filters.push(char_filter);
        self
    }

    /// Append a token filter; token filters run in insertion order.
    pub fn with_filter(mut self, filter: Arc<dyn Filter>) -> Self {
        self.filters.push(filter);
        self
    }

    /// Stage names in execution order.
    pub fn stages(&self) -> Vec<&'static str> {
        self.char_filters
            .iter()
            .map(|f| f.name())
            .chain(std::iter::once(self.tokenizer.name()))
            .chain(self.filters.iter().map(|f| f.name()))
            .collect()
    }
}

impl Analyzer for PipelineAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        let filtered = self
            .char_filters
            .iter()
            .fold(Cow::Borrowed(text), |text, char_filter| {
                Cow::Owned(char_filter.filter(&text))
            });

        let tokens = self.tokenizer.tokenize(&filtered)?;
        self.filters
            .iter()
            .try_fold(tokens, |tokens, filter| filter.filter(tokens))
    }

    fn name(&self) -> &'static str {
        "pipeline"
    }
}

impl fmt::Debug for PipelineAnalyzer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PipelineAnalyzer")
            .field(&self.stages().join(" > "))
            .finish()
    }
}
