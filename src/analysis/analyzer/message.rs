//! Analyzer for disaster-response message bodies.
//!
//! # Pipeline
//!
//! 1. URL char filter (every URL becomes the placeholder word)
//! 2. Punctuation char filter (optional)
//! 3. UnicodeWordTokenizer
//! 4. LowercaseFilter
//! 5. LemmaFilter (English noun lemmas)
//! 6. StripFilter + RemoveEmptyFilter
//!
//! # Examples
//!
//! ```
//! use triage::analysis::analyzer::{Analyzer, MessageAnalyzer};
//!
//! let analyzer = MessageAnalyzer::new().unwrap();
//! let terms = analyzer.terms("Need Tents at http://t.co/xyz !").unwrap();
//!
//! assert_eq!(terms, vec!["need", "tent", "at", "urlplaceholder"]);
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::analyzer::Analyzer;
use crate::analysis::analyzer::pipeline::PipelineAnalyzer;
use crate::analysis::char_filter::{PatternReplaceCharFilter, PunctuationCharFilter};
use crate::analysis::token::TokenStream;
use crate::analysis::token_filter::{
    LemmaFilter, LowercaseFilter, RemoveEmptyFilter, StripFilter,
};
use crate::analysis::tokenizer::UnicodeWordTokenizer;
use crate::error::{Result, TriageError};

/// Default replacement for URLs.
pub const DEFAULT_URL_PLACEHOLDER: &str = "urlplaceholder";

/// Configuration of the message analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Word substituted for every URL.
    pub url_placeholder: String,
    /// Delete ASCII punctuation before tokenizing.
    pub strip_punctuation: bool,
    /// Reduce tokens to their lemma.
    pub lemmatize: bool,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            url_placeholder: DEFAULT_URL_PLACEHOLDER.to_string(),
            strip_punctuation: true,
            lemmatize: true,
        }
    }
}

impl AnalyzerConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let placeholder = &self.url_placeholder;
        if placeholder.is_empty() || !placeholder.chars().all(|c| c.is_alphanumeric()) {
            return Err(TriageError::invalid_config(format!(
                "url_placeholder must be a non-empty alphanumeric word, got {placeholder:?}"
            )));
        }
        Ok(())
    }
}

/// The analyzer used for message bodies.
///
/// Serializes as its [`AnalyzerConfig`]; the filter chain is rebuilt on
/// deserialization.
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "AnalyzerConfig", into = "AnalyzerConfig")]
pub struct MessageAnalyzer {
    config: AnalyzerConfig,
    inner: PipelineAnalyzer,
}

impl MessageAnalyzer {
    /// Create a message analyzer with default settings.
    pub fn new() -> Result<Self> {
        Self::with_config(AnalyzerConfig::default())
    }

    /// Create a message analyzer from a configuration.
    pub fn with_config(config: AnalyzerConfig) -> Result<Self> {
        config.validate()?;

        let tokenizer = UnicodeWordTokenizer::new().with_placeholder(config.url_placeholder.clone());
        let mut analyzer = PipelineAnalyzer::new(Arc::new(tokenizer))
            .with_char_filter(Arc::new(PatternReplaceCharFilter::urls(&config.url_placeholder)?));
        if config.strip_punctuation {
            analyzer = analyzer.with_char_filter(Arc::new(PunctuationCharFilter::new()));
        }

        analyzer = analyzer.with_filter(Arc::new(LowercaseFilter::new()));
        if config.lemmatize {
            analyzer = analyzer.with_filter(Arc::new(LemmaFilter::new()));
        }
        let inner = analyzer
            .with_filter(Arc::new(StripFilter::new()))
            .with_filter(Arc::new(RemoveEmptyFilter::new()));

        Ok(MessageAnalyzer { config, inner })
    }

    /// Get the configuration this analyzer was built from.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Get the inner pipeline analyzer.
    pub fn inner(&self) -> &PipelineAnalyzer {
        &self.inner
    }
}

impl Analyzer for MessageAnalyzer {
    fn analyze(&self, text: &str) -> Result<TokenStream> {
        self.inner.analyze(text)
    }

    fn name(&self) -> &'static str {
        "message"
    }
}

impl TryFrom<AnalyzerConfig> for MessageAnalyzer {
    type Error = TriageError;

    fn try_from(config: AnalyzerConfig) -> Result<Self> {
        MessageAnalyzer::with_config(config)
    }
}

impl From<MessageAnalyzer> for AnalyzerConfig {
    fn from(analyzer: MessageAnalyzer) -> Self {
        analyzer.config
    }
}

impl std::fmt::Debug for MessageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageAnalyzer")
            .field("config", &self.config)
            .field("inner", &self.inner)
            .finish()
    }
}
