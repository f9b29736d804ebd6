//! The fitted text classification pipeline.
//!
//! ```text
//! messages → MessageAnalyzer → TfidfVectorizer → MultiOutputClassifier → labels
//! ```
//!
//! The pipeline owns every piece of fitted state, so a saved pipeline
//! reproduces the exact same predictions after loading.

use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{Analyzer, AnalyzerConfig, MessageAnalyzer};
use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::error::{Result, TriageError};
use crate::features::vectorizer::{TfidfVectorizer, VectorizerConfig};
use crate::ml::artifact;
use crate::ml::forest::ForestConfig;
use crate::ml::multi_output::MultiOutputClassifier;
use crate::ml::search::ScoringMetric;

/// Provenance of a fitted pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub model_id: uuid::Uuid,
    pub trained_at: DateTime<Utc>,
    pub n_training_rows: usize,
    pub vocabulary_size: usize,
    pub vectorizer: VectorizerConfig,
    pub forest: ForestConfig,
    /// Cross-validation score of the winning grid candidate.
    pub search_score: Option<f64>,
    pub scoring: Option<ScoringMetric>,
    pub version: String,
}

/// Analyzer, vectorizer and per-category models.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPipeline {
    analyzer: MessageAnalyzer,
    vectorizer: TfidfVectorizer,
    classifier: MultiOutputClassifier,
    metadata: Option<ModelMetadata>,
}

impl TextPipeline {
    /// Create an unfitted pipeline.
    pub fn new(
        analyzer: AnalyzerConfig,
        vectorizer: VectorizerConfig,
        forest: ForestConfig,
    ) -> Result<Self> {
        Ok(TextPipeline {
            analyzer: MessageAnalyzer::with_config(analyzer)?,
            vectorizer: TfidfVectorizer::new(vectorizer)?,
            classifier: MultiOutputClassifier::new(forest)?,
            metadata: None,
        })
    }

    /// Analyze every text, in parallel, keeping input order.
    pub fn analyze_all<S: AsRef<str> + Sync>(
        analyzer: &MessageAnalyzer,
        texts: &[S],
    ) -> Result<Vec<Vec<String>>> {
        texts
            .par_iter()
            .map(|text| analyzer.terms(text.as_ref()))
            .collect()
    }

    /// Fit on raw message texts.
    pub fn fit<S: AsRef<str> + Sync>(
        &mut self,
        texts: &[S],
        labels: &LabelMatrix,
        categories: &CategorySet,
    ) -> Result<()> {
        let tokens = Self::analyze_all(&self.analyzer, texts)?;
        self.fit_tokens(&tokens, labels, categories)
    }

    /// Fit on texts that were already analyzed with this pipeline's
    /// analyzer.
    pub fn fit_tokens(
        &mut self,
        tokens: &[Vec<String>],
        labels: &LabelMatrix,
        categories: &CategorySet,
    ) -> Result<()> {
        if tokens.len() != labels.n_rows() {
            return Err(TriageError::shape_mismatch(format!(
                "{} messages but {} label rows",
                tokens.len(),
                labels.n_rows()
            )));
        }

        // A failed refit leaves the previous fitted state untouched.
        let mut vectorizer = TfidfVectorizer::new(self.vectorizer.config().clone())?;
        let mut classifier = MultiOutputClassifier::new(self.classifier.config().clone())?;
        let features = vectorizer.fit_transform(tokens)?;
        classifier.fit(&features, labels, categories)?;
        self.vectorizer = vectorizer;
        self.classifier = classifier;

        for name in self.classifier.degenerate_labels() {
            log::warn!("Category '{name}' has a single value in the training data");
        }

        self.metadata = Some(ModelMetadata {
            model_id: uuid::Uuid::new_v4(),
            trained_at: Utc::now(),
            n_training_rows: tokens.len(),
            vocabulary_size: self.vectorizer.vocabulary_size(),
            vectorizer: self.vectorizer.config().clone(),
            forest: self.classifier.config().clone(),
            search_score: None,
            scoring: None,
            version: crate::VERSION.to_string(),
        });
        Ok(())
    }

    /// Record the cross-validation result that selected this configuration.
    pub fn record_search(&mut self, scoring: ScoringMetric, score: f64) {
        if let Some(metadata) = &mut self.metadata {
            metadata.scoring = Some(scoring);
            metadata.search_score = Some(score);
        }
    }

    /// Predict every category for raw texts.
    pub fn predict<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<LabelMatrix> {
        let tokens = Self::analyze_all(&self.analyzer, texts)?;
        self.predict_tokens(&tokens)
    }

    /// Predict every category for analyzed texts.
    pub fn predict_tokens(&self, tokens: &[Vec<String>]) -> Result<LabelMatrix> {
        self.ensure_fitted()?;
        let features = self.vectorizer.transform(tokens)?;
        self.classifier.predict(&features)
    }

    /// Positive probability per category (outer) and text (inner).
    pub fn predict_proba<S: AsRef<str> + Sync>(&self, texts: &[S]) -> Result<Vec<Vec<f64>>> {
        self.ensure_fitted()?;
        let tokens = Self::analyze_all(&self.analyzer, texts)?;
        let features = self.vectorizer.transform(&tokens)?;
        self.classifier.predict_proba(&features)
    }

    fn ensure_fitted(&self) -> Result<()> {
        if !self.is_fitted() {
            return Err(TriageError::not_fitted(
                "pipeline must be fitted before predict",
            ));
        }
        Ok(())
    }

    pub fn is_fitted(&self) -> bool {
        self.vectorizer.is_fitted() && self.classifier.is_fitted()
    }

    pub fn analyzer(&self) -> &MessageAnalyzer {
        &self.analyzer
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn classifier(&self) -> &MultiOutputClassifier {
        &self.classifier
    }

    pub fn metadata(&self) -> Option<&ModelMetadata> {
        self.metadata.as_ref()
    }

    /// Categories the pipeline was fitted on.
    pub fn categories(&self) -> Option<&CategorySet> {
        self.classifier.categories()
    }

    /// Categories that were constant during training.
    pub fn degenerate_labels(&self) -> Vec<&str> {
        self.classifier.degenerate_labels()
    }

    /// Save the fitted pipeline.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.ensure_fitted()?;
        artifact::write_artifact(self, path)
    }

    /// Load a pipeline saved with [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let pipeline: TextPipeline = artifact::read_artifact(path)?;
        pipeline.ensure_fitted()?;
        Ok(pipeline)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn corpus() -> (Vec<&'static str>, LabelMatrix, CategorySet) {
        let texts = vec![
            "We need water and food",
            "The bridge collapsed after the storm",
            "Send water, the bridge is gone",
            "Thank you for the update",
        ];
        let labels =
            LabelMatrix::from_rows(vec![vec![1, 0], vec![0, 1], vec![1, 1], vec![0, 0]], 2)
                .unwrap();
        let categories = CategorySet::new(["water", "infrastructure"]).unwrap();
        (texts, labels, categories)
    }

    fn pipeline() -> TextPipeline {
        TextPipeline::new(
            AnalyzerConfig::default(),
            VectorizerConfig::default(),
            ForestConfig {
                n_estimators: 10,
                ..ForestConfig::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn test_fit_predict() {
        let (texts, labels, categories) = corpus();
        let mut pipeline = pipeline();
        pipeline.fit(&texts, &labels, &categories).unwrap();

        let predicted = pipeline.predict(&texts).unwrap();
        assert_eq!(predicted.n_rows(), 4);
        assert_eq!(predicted.n_cols(), 2);

        let metadata = pipeline.metadata().unwrap();
        assert_eq!(metadata.n_training_rows, 4);
        assert!(metadata.vocabulary_size > 0);
    }

    #[test]
    fn test_predict_before_fit() {
        let err = pipeline().predict(&["help"]).unwrap_err();
        assert!(matches!(err, TriageError::NotFitted(_)));
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("classifier.bin");
        let (texts, labels, categories) = corpus();

        let mut pipeline = pipeline();
        pipeline.fit(&texts, &labels, &categories).unwrap();
        pipeline.save(&path).unwrap();

        let loaded = TextPipeline::load(&path).unwrap();
        let unseen = ["water please", "storm damage on the bridge"];
        assert_eq!(loaded.predict(&unseen).unwrap(), pipeline.predict(&unseen).unwrap());
        assert_eq!(
            loaded.predict_proba(&unseen).unwrap(),
            pipeline.predict_proba(&unseen).unwrap()
        );
        assert_eq!(loaded.metadata(), pipeline.metadata());
    }

    #[test]
    fn test_failed_refit_keeps_previous_state() {
        let (texts, labels, categories) = corpus();
        let mut pipeline = pipeline();
        pipeline.fit(&texts, &labels, &categories).unwrap();
        let vocabulary = pipeline.vectorizer().vocabulary().to_vec();
        let predicted = pipeline.predict(&texts).unwrap();
        let metadata = pipeline.metadata().cloned();

        let other_labels = LabelMatrix::from_rows(vec![vec![1, 0], vec![0, 1]], 2).unwrap();
        let one_category = CategorySet::new(["water"]).unwrap();
        let err = pipeline
            .fit(&["cherry", "durian"], &other_labels, &one_category)
            .unwrap_err();
        assert!(matches!(err, TriageError::ShapeMismatch(_)));

        assert_eq!(pipeline.vectorizer().vocabulary(), vocabulary.as_slice());
        assert_eq!(pipeline.predict(&texts).unwrap(), predicted);
        assert_eq!(pipeline.metadata().cloned(), metadata);
    }

    #[test]
    fn test_save_unfitted() {
        let dir = TempDir::new().unwrap();
        assert!(pipeline().save(dir.path().join("x.bin")).is_err());
    }
}
