//! ASCII punctuation removal.

use super::CharFilter;

/// A char filter that deletes ASCII punctuation characters.
///
/// Characters are removed rather than replaced with a space, so a contraction
/// such as `don't` becomes the single word `dont`.
#[derive(Clone, Debug, Default)]
pub struct PunctuationCharFilter;

impl PunctuationCharFilter {
    /// Create a new punctuation filter.
    pub fn new() -> Self {
        PunctuationCharFilter
    }
}

impl CharFilter for PunctuationCharFilter {
    fn filter(&self, input: &str) -> String {
        input.chars().filter(|c| !c.is_ascii_punctuation()).collect()
    }

    fn name(&self) -> &'static str {
        "punctuation"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_removed() {
        let filter = PunctuationCharFilter::new();
        assert_eq!(
            filter.filter("Help! We don't have (any) food..."),
            "Help We dont have any food"
        );
    }

    #[test]
    fn test_non_ascii_kept() {
        let filter = PunctuationCharFilter::new();
        assert_eq!(filter.filter("café «ouvert»"), "café «ouvert»");
    }
}
