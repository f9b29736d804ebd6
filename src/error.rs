//! Error types for the triage library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`TriageError`] enum. Boundary errors (missing files, malformed tables)
//! and pipeline errors (using a model before it was fitted, mismatched
//! matrix shapes) share the one type so they propagate with `?`.
//!
//! # Examples
//!
//! ```
//! use triage::error::{TriageError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(TriageError::invalid_argument("Invalid input"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;
use std::path::Path;

use thiserror::Error;

/// The main error type for triage operations.
#[derive(Error, Debug)]
pub enum TriageError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A required input file does not exist.
    #[error("Missing input: {path} not found")]
    MissingInput { path: String },

    /// A transform or prediction was requested before fitting.
    #[error("Not fitted: {0}")]
    NotFitted(String),

    /// Feature and label matrices disagree in shape.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The configured work exceeds an explicit bound.
    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Analysis-related errors (tokenization, filtering, etc.)
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// Malformed input tables.
    #[error("Data error: {0}")]
    Data(String),

    /// Invalid argument or configuration value.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// CSV read/write errors
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with TriageError.
pub type Result<T> = std::result::Result<T, TriageError>;

impl TriageError {
    /// Create a missing input error for the given path.
    pub fn missing_input<P: AsRef<Path>>(path: P) -> Self {
        TriageError::MissingInput {
            path: path.as_ref().display().to_string(),
        }
    }

    /// Create a new not fitted error.
    pub fn not_fitted<S: Into<String>>(msg: S) -> Self {
        TriageError::NotFitted(msg.into())
    }

    /// Create a new shape mismatch error.
    pub fn shape_mismatch<S: Into<String>>(msg: S) -> Self {
        TriageError::ShapeMismatch(msg.into())
    }

    /// Create a new resource exhausted error.
    pub fn resource_exhausted<S: Into<String>>(msg: S) -> Self {
        TriageError::ResourceExhausted(msg.into())
    }

    /// Create a new analysis error.
    pub fn analysis<S: Into<String>>(msg: S) -> Self {
        TriageError::Analysis(msg.into())
    }

    /// Create a new data error.
    pub fn data<S: Into<String>>(msg: S) -> Self {
        TriageError::Data(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        TriageError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        TriageError::InvalidArgument(format!("configuration: {}", msg.into()))
    }

    /// Create a new serialization error.
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        TriageError::Serialization(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        TriageError::Other(msg.into())
    }

    /// Create a new internal error.
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        TriageError::Other(format!("Internal error: {}", msg.into()))
    }
}
