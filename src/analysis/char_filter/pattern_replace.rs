//! Regex replacement char filter.

use std::borrow::Cow;
use std::sync::Arc;

use regex::{NoExpand, Regex};

use super::CharFilter;
use crate::error::{Result, TriageError};

/// URL-shaped substrings: a lowercase `http`/`https` scheme followed by the
/// broad URL character class.
pub const URL_PATTERN: &str =
    r"http[s]?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*\(\),]|(?:%[0-9a-fA-F][0-9a-fA-F]))+";

/// A char filter that replaces every match of a regex with a fixed string.
#[derive(Clone, Debug)]
pub struct PatternReplaceCharFilter {
    pattern: Arc<Regex>,
    replacement: String,
}

impl PatternReplaceCharFilter {
    /// Create a new pattern replace char filter.
    pub fn new(pattern: &str, replacement: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| TriageError::analysis(format!("Invalid regex pattern: {e}")))?;

        Ok(Self {
            pattern: Arc::new(regex),
            replacement: replacement.to_string(),
        })
    }

    /// Create a filter that replaces URLs with `placeholder`.
    ///
    /// The placeholder is padded with spaces so that it always forms a word
    /// of its own, even when the URL was glued to surrounding text.
    pub fn urls(placeholder: &str) -> Result<Self> {
        Self::new(URL_PATTERN, &format!(" {placeholder} "))
    }

    /// Get the regex pattern used by this filter.
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

impl CharFilter for PatternReplaceCharFilter {
    fn filter(&self, input: &str) -> String {
        match self
            .pattern
            .replace_all(input, NoExpand(self.replacement.as_str()))
        {
            Cow::Borrowed(unchanged) => unchanged.to_string(),
            Cow::Owned(replaced) => replaced,
        }
    }

    fn name(&self) -> &'static str {
        "pattern_replace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_replace() {
        let filter = PatternReplaceCharFilter::new(r"\d+", "NUM").unwrap();
        assert_eq!(filter.filter("Year 2024"), "Year NUM");
    }

    #[test]
    fn test_url_replacement() {
        let filter = PatternReplaceCharFilter::urls("urlplaceholder").unwrap();
        let output = filter.filter("Info at http://bit.ly/abc%20d?x=1 now");

        assert_eq!(output.matches("urlplaceholder").count(), 1);
        assert!(!output.contains("bit.ly"));
        assert!(output.ends_with(" now"));
    }

    #[test]
    fn test_url_scheme_is_case_sensitive() {
        let filter = PatternReplaceCharFilter::urls("urlplaceholder").unwrap();

        assert_eq!(
            filter.filter("https://Example.org/Help").trim(),
            "urlplaceholder"
        );
        assert_eq!(
            filter.filter("HTTPS://Example.org/Help"),
            "HTTPS://Example.org/Help"
        );
    }

    #[test]
    fn test_no_url() {
        let filter = PatternReplaceCharFilter::urls("urlplaceholder").unwrap();
        assert_eq!(filter.filter("no links here"), "no links here");
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(PatternReplaceCharFilter::new("(", "x").is_err());
    }
}
