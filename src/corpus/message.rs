//! A single labeled disaster-response message.

use serde::{Deserialize, Serialize};

/// One message of the corpus.
///
/// Messages are immutable once built; the builder methods consume `self`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Message {
    id: i64,
    text: String,
    original: Option<String>,
    genre: Option<String>,
}

impl Message {
    /// Create a message with an identifier and an English body.
    pub fn new<S: Into<String>>(id: i64, text: S) -> Self {
        Message {
            id,
            text: text.into(),
            original: None,
            genre: None,
        }
    }

    /// Attach the untranslated text. Empty strings are stored as `None`.
    pub fn with_original<S: Into<String>>(mut self, original: S) -> Self {
        self.original = non_empty(original.into());
        self
    }

    /// Attach the genre tag (`direct`, `news`, `social`, ...).
    pub fn with_genre<S: Into<String>>(mut self, genre: S) -> Self {
        self.genre = non_empty(genre.into());
        self
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    /// The message body the classifier reads.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    pub fn genre(&self) -> Option<&str> {
        self.genre.as_deref()
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}
