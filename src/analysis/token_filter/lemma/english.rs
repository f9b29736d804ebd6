//! Dictionary-free English noun lemmatizer.
//!
//! Reduces plural nouns to their singular form the way WordNet's noun
//! morphology does: irregular forms come from an exception table, regular
//! forms from ordered suffix-detachment rules. Words known to end in `s`
//! while singular are protected by an invariant list.
//!
//! The tables are a process-wide resource, built on first use and read-only
//! afterwards.
//!
//! # Examples
//!
//! ```
//! use triage::analysis::token_filter::lemma::{EnglishLemmatizer, Lemmatizer};
//!
//! let lemmatizer = EnglishLemmatizer::new();
//!
//! assert_eq!(lemmatizer.lemmatize("supplies"), "supply");
//! assert_eq!(lemmatizer.lemmatize("women"), "woman");
//! assert_eq!(lemmatizer.lemmatize("crisis"), "crisis");
//! ```

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;

use super::Lemmatizer;

lazy_static! {
    static ref IRREGULAR: HashMap<&'static str, &'static str> = [
        ("children", "child"),
        ("men", "man"),
        ("women", "woman"),
        ("feet", "foot"),
        ("teeth", "tooth"),
        ("geese", "goose"),
        ("mice", "mouse"),
        ("lice", "louse"),
        ("oxen", "ox"),
        ("wives", "wife"),
        ("lives", "life"),
        ("knives", "knife"),
        ("leaves", "leaf"),
        ("halves", "half"),
        ("shelves", "shelf"),
        ("wolves", "wolf"),
        ("loaves", "loaf"),
        ("thieves", "thief"),
        ("calves", "calf"),
        ("selves", "self"),
        ("indices", "index"),
        ("matrices", "matrix"),
        ("analyses", "analysis"),
        ("crises", "crisis"),
        ("bases", "basis"),
        ("diagnoses", "diagnosis"),
        ("phenomena", "phenomenon"),
        ("criteria", "criterion"),
        ("media", "medium"),
        ("data", "datum"),
        ("potatoes", "potato"),
        ("tomatoes", "tomato"),
        ("heroes", "hero"),
        ("volcanoes", "volcano"),
        ("tornadoes", "tornado"),
        ("echoes", "echo"),
        ("dominoes", "domino"),
    ]
    .into_iter()
    .collect();

    static ref INVARIANT: HashSet<&'static str> = [
        "is", "was", "has", "does", "this", "his", "its", "us", "as", "yes",
        "always", "perhaps", "thus", "whereas", "plus", "news", "series",
        "species", "means", "politics", "physics", "economics", "mathematics",
        "bus", "gas", "lens", "chaos", "tennis", "aids", "besides", "towards",
        "afterwards", "sometimes", "christmas", "texas", "kansas", "arkansas",
        "paris", "pants", "scissors", "clothes", "thanks",
        "goods", "premises", "headquarters", "barracks", "alms",
        "goes", "bias", "alias", "atlas", "canvas", "pancreas", "measles",
        "diabetes", "herpes", "rabies", "mumps", "specimen", "abdomen",
        "omen", "regimen", "acumen", "stamen",
    ]
    .into_iter()
    .collect();

    /// Ordered detachment rules: `(suffix, replacement)`.
    static ref RULES: Vec<(&'static str, &'static str)> = vec![
        ("sses", "ss"),
        ("ies", "y"),
        ("ches", "ch"),
        ("shes", "sh"),
        ("xes", "x"),
        ("zzes", "zz"),
        ("men", "man"),
        ("s", ""),
    ];
}

/// Singular endings that must never lose a trailing `s`.
const PROTECTED_ENDINGS: &[&str] = &["ss", "us", "is", "ous", "'s"];

/// English noun lemmatizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnglishLemmatizer;

impl EnglishLemmatizer {
    /// Create a new English lemmatizer.
    pub fn new() -> Self {
        EnglishLemmatizer
    }

    /// Force initialization of the lemma tables.
    ///
    /// Calling this at startup keeps the one-time build out of timed code.
    pub fn preload() {
        lazy_static::initialize(&IRREGULAR);
        lazy_static::initialize(&INVARIANT);
        lazy_static::initialize(&RULES);
    }

    fn apply_rules(word: &str) -> Option<String> {
        if PROTECTED_ENDINGS.iter().any(|e| word.ends_with(e)) {
            return None;
        }

        for (suffix, replacement) in RULES.iter() {
            if !word.ends_with(suffix) {
                continue;
            }
            let stem = &word[..word.len() - suffix.len()];
            if stem.chars().count() < 2 || stem.chars().count() + replacement.len() < 3 {
                return None;
            }
            return Some(format!("{stem}{replacement}"));
        }

        None
    }
}

impl Lemmatizer for EnglishLemmatizer {
    fn lemmatize(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        if let Some(lemma) = IRREGULAR.get(lower.as_str()) {
            return (*lemma).to_string();
        }
        if lower.chars().count() <= 3
            || !lower.chars().all(|c| c.is_alphabetic())
            || INVARIANT.contains(lower.as_str())
        {
            return word.to_string();
        }

        Self::apply_rules(&lower).unwrap_or_else(|| word.to_string())
    }

    fn name(&self) -> &'static str {
        "english"
    }
}
