//! Training configuration.
//!
//! [`TrainingConfig`] bundles every knob of a training run. Each section has
//! a `Default` matching the stock pipeline and can be overridden from a JSON
//! file in which any omitted field keeps its default:
//!
//! ```json
//! {
//!   "split": { "test_size": 0.25 },
//!   "search": { "folds": 3, "n_jobs": 4 },
//!   "forest": { "n_estimators": 50 }
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

pub use crate::analysis::analyzer::AnalyzerConfig;
pub use crate::features::VectorizerConfig;
pub use crate::ml::forest::{ForestConfig, MaxFeatures};
pub use crate::ml::search::{ParamGrid, ScoringMetric, SearchConfig};

/// Where the text and the labels live in the cleaned table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Column index of the message body.
    pub message_column: usize,
    /// Column index of the first category; every later column is a category.
    pub label_offset: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            message_column: 1,
            label_offset: 4,
        }
    }
}

impl DatasetConfig {
    pub fn validate(&self) -> Result<()> {
        if self.message_column >= self.label_offset {
            return Err(TriageError::invalid_config(format!(
                "message_column ({}) must come before label_offset ({})",
                self.message_column, self.label_offset
            )));
        }
        Ok(())
    }
}

/// Hold-out split settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows held out for evaluation.
    pub test_size: f64,
    /// Seed of the shuffle.
    pub seed: u64,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 42,
        }
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(TriageError::invalid_config(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

/// Complete configuration of a training run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub dataset: DatasetConfig,
    pub split: SplitConfig,
    pub analyzer: AnalyzerConfig,
    /// Vectorizer used when grid search is disabled.
    pub vectorizer: VectorizerConfig,
    /// Forest used when grid search is disabled; the base of every candidate.
    pub forest: ForestConfig,
    pub search: SearchConfig,
}

impl TrainingConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(TriageError::missing_input(path));
        }

        let content = std::fs::read_to_string(path)?;
        let config: TrainingConfig = serde_json::from_str(&content)?;
        config.validate()?;

        log::debug!("Loaded training configuration from {}", path.display());
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.dataset.validate()?;
        self.split.validate()?;
        self.analyzer.validate()?;
        self.vectorizer.validate()?;
        self.forest.validate()?;
        self.search.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = TrainingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dataset.message_column, 1);
        assert_eq!(config.dataset.label_offset, 4);
        assert_eq!(config.split.test_size, 0.2);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "split": {{ "test_size": 0.25 }}, "forest": {{ "n_estimators": 7 }} }}"#
        )
        .unwrap();

        let config = TrainingConfig::from_file(file.path()).unwrap();
        assert_eq!(config.split.test_size, 0.25);
        assert_eq!(config.split.seed, 42);
        assert_eq!(config.forest.n_estimators, 7);
        assert_eq!(config.search, SearchConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = TrainingConfig::from_file("/nonexistent/triage.json").unwrap_err();
        assert!(matches!(err, TriageError::MissingInput { .. }));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = TrainingConfig::default();
        config.split.test_size = 1.0;
        assert!(config.validate().is_err());

        let mut config = TrainingConfig::default();
        config.dataset.label_offset = 1;
        assert!(config.validate().is_err());
    }
}
