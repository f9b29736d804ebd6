//! Exhaustive hyperparameter search with k-fold cross-validation.
//!
//! Every (candidate, fold) pair is an independent unit of work. Units run on
//! a dedicated rayon pool; scores are gathered in enumeration order and
//! reduced to the highest mean, the first candidate winning ties. The result
//! therefore does not depend on the number of workers.

use std::fmt;

use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::analysis::analyzer::{AnalyzerConfig, MessageAnalyzer};
use crate::config::TrainingConfig;
use crate::corpus::dataset::{Dataset, k_fold_indices};
use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::error::{Result, TriageError};
use crate::features::vectorizer::{TfidfVectorizer, VectorizerConfig};
use crate::ml::forest::ForestConfig;
use crate::ml::metrics;
use crate::ml::multi_output::MultiOutputClassifier;
use crate::ml::pipeline::TextPipeline;

/// Score used to rank candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringMetric {
    /// Fraction of rows whose whole label row is exact.
    #[default]
    SubsetAccuracy,
    /// Fraction of label cells that are correct.
    HammingAccuracy,
    /// Positive-class F1 over all cells pooled.
    MicroF1,
    /// Mean positive-class F1 over categories.
    MacroF1,
}

impl ScoringMetric {
    pub fn score(&self, truth: &LabelMatrix, predicted: &LabelMatrix) -> Result<f64> {
        truth.check_same_shape(predicted)?;
        Ok(match self {
            ScoringMetric::SubsetAccuracy => metrics::subset_accuracy(truth, predicted),
            ScoringMetric::HammingAccuracy => metrics::hamming_accuracy(truth, predicted),
            ScoringMetric::MicroF1 => metrics::micro_f1(truth, predicted),
            ScoringMetric::MacroF1 => metrics::macro_f1(truth, predicted),
        })
    }

    pub fn name(&self) -> &'static str {
        match self {
            ScoringMetric::SubsetAccuracy => "subset_accuracy",
            ScoringMetric::HammingAccuracy => "hamming_accuracy",
            ScoringMetric::MicroF1 => "micro_f1",
            ScoringMetric::MacroF1 => "macro_f1",
        }
    }
}

impl fmt::Display for ScoringMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Candidate values of every searched parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParamGrid {
    pub ngram_range: Vec<(usize, usize)>,
    pub max_df: Vec<f64>,
    pub max_features: Vec<Option<usize>>,
    pub use_idf: Vec<bool>,
    pub n_estimators: Vec<usize>,
    pub min_samples_split: Vec<usize>,
}

impl Default for ParamGrid {
    fn default() -> Self {
        Self {
            ngram_range: vec![(1, 1), (1, 2)],
            max_df: vec![0.5, 0.75, 1.0],
            max_features: vec![None, Some(5000), Some(10000)],
            use_idf: vec![true, false],
            n_estimators: vec![50, 100, 200],
            min_samples_split: vec![2, 3, 4],
        }
    }
}

impl ParamGrid {
    /// A grid with a single candidate taken from the given configurations.
    pub fn single(vectorizer: &VectorizerConfig, forest: &ForestConfig) -> Self {
        ParamGrid {
            ngram_range: vec![vectorizer.ngram_range],
            max_df: vec![vectorizer.max_df],
            max_features: vec![vectorizer.max_features],
            use_idf: vec![vectorizer.use_idf],
            n_estimators: vec![forest.n_estimators],
            min_samples_split: vec![forest.min_samples_split],
        }
    }

    /// Number of candidates, saturating on overflow.
    pub fn cardinality(&self) -> usize {
        [
            self.ngram_range.len(),
            self.max_df.len(),
            self.max_features.len(),
            self.use_idf.len(),
            self.n_estimators.len(),
            self.min_samples_split.len(),
        ]
        .into_iter()
        .fold(1usize, |acc, n| acc.saturating_mul(n))
    }

    pub fn validate(&self) -> Result<()> {
        let lists = [
            ("ngram_range", self.ngram_range.is_empty()),
            ("max_df", self.max_df.is_empty()),
            ("max_features", self.max_features.is_empty()),
            ("use_idf", self.use_idf.is_empty()),
            ("n_estimators", self.n_estimators.is_empty()),
            ("min_samples_split", self.min_samples_split.is_empty()),
        ];
        if let Some((name, _)) = lists.iter().find(|(_, empty)| *empty) {
            return Err(TriageError::invalid_config(format!(
                "param grid '{name}' has no values"
            )));
        }
        Ok(())
    }

    /// Enumerate candidates, the last parameter varying fastest. Forest
    /// settings outside the grid come from `base`.
    pub fn candidates(&self, base: &ForestConfig) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::with_capacity(self.cardinality());
        for &ngram_range in &self.ngram_range {
            for &max_df in &self.max_df {
                for &max_features in &self.max_features {
                    for &use_idf in &self.use_idf {
                        for &n_estimators in &self.n_estimators {
                            for &min_samples_split in &self.min_samples_split {
                                let candidate = Candidate {
                                    vectorizer: VectorizerConfig {
                                        ngram_range,
                                        max_df,
                                        max_features,
                                        use_idf,
                                    },
                                    forest: ForestConfig {
                                        n_estimators,
                                        min_samples_split,
                                        ..base.clone()
                                    },
                                };
                                candidate.vectorizer.validate()?;
                                candidate.forest.validate()?;
                                candidates.push(candidate);
                            }
                        }
                    }
                }
            }
        }
        Ok(candidates)
    }
}

/// Search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Run the search; when false the default configuration is fitted
    /// directly.
    pub enabled: bool,
    pub folds: usize,
    pub scoring: ScoringMetric,
    /// Worker threads; `None` uses every CPU.
    pub n_jobs: Option<usize>,
    /// Reject grids with more candidates than this.
    pub max_candidates: Option<usize>,
    pub grid: ParamGrid,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            folds: 5,
            scoring: ScoringMetric::default(),
            n_jobs: None,
            max_candidates: None,
            grid: ParamGrid::default(),
        }
    }
}

impl SearchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.folds < 2 {
            return Err(TriageError::invalid_config(format!(
                "folds must be at least 2, got {}",
                self.folds
            )));
        }
        if self.n_jobs == Some(0) {
            return Err(TriageError::invalid_config("n_jobs must be positive"));
        }
        self.grid.validate()
    }

    /// Resolved worker count.
    pub fn workers(&self) -> usize {
        self.n_jobs.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// One point of the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub vectorizer: VectorizerConfig,
    pub forest: ForestConfig,
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let max_features = match self.vectorizer.max_features {
            Some(n) => n.to_string(),
            None => "all".to_string(),
        };
        write!(
            f,
            "ngram_range={:?} max_df={} max_features={} use_idf={} n_estimators={} min_samples_split={}",
            self.vectorizer.ngram_range,
            self.vectorizer.max_df,
            max_features,
            self.vectorizer.use_idf,
            self.forest.n_estimators,
            self.forest.min_samples_split
        )
    }
}

/// Cross-validation result of one candidate.
///
/// A candidate whose fit fails on any fold keeps the scores of the folds
/// that succeeded, a `mean_score` of 0.0 and the first failure in `error`.
/// It never wins the search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate: Candidate,
    pub fold_scores: Vec<f64>,
    pub mean_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CandidateScore {
    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

/// Summary of a finished search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub scoring: ScoringMetric,
    pub folds: usize,
    pub scores: Vec<CandidateScore>,
    pub best_index: usize,
}

impl SearchReport {
    pub fn best(&self) -> &CandidateScore {
        &self.scores[self.best_index]
    }
}

/// Grid search controller.
#[derive(Debug, Clone)]
pub struct GridSearch {
    config: SearchConfig,
    analyzer: AnalyzerConfig,
    base_forest: ForestConfig,
}

impl GridSearch {
    /// Create a controller. `base_forest` supplies every forest setting the
    /// grid does not vary.
    pub fn new(config: SearchConfig, analyzer: AnalyzerConfig, base_forest: ForestConfig) -> Result<Self> {
        config.validate()?;
        analyzer.validate()?;
        base_forest.validate()?;
        Ok(GridSearch {
            config,
            analyzer,
            base_forest,
        })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Enumerate the candidates, enforcing `max_candidates`.
    pub fn candidates(&self) -> Result<Vec<Candidate>> {
        let cardinality = self.config.grid.cardinality();
        if let Some(limit) = self.config.max_candidates {
            if cardinality > limit {
                return Err(TriageError::resource_exhausted(format!(
                    "param grid has {cardinality} candidates, limit is {limit}"
                )));
            }
        }
        self.config.grid.candidates(&self.base_forest)
    }

    /// Score every candidate, refit the winner on all rows and return it.
    pub fn fit<S: AsRef<str> + Sync>(
        &self,
        texts: &[S],
        labels: &LabelMatrix,
        categories: &CategorySet,
    ) -> Result<(TextPipeline, SearchReport)> {
        let candidates = self.candidates()?;
        if texts.len() != labels.n_rows() {
            return Err(TriageError::shape_mismatch(format!(
                "{} messages but {} label rows",
                texts.len(),
                labels.n_rows()
            )));
        }
        let folds = k_fold_indices(texts.len(), self.config.folds)?;

        let workers = self.config.workers();
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("grid-search-{i}"))
            .build()
            .map_err(|e| TriageError::internal(format!("Failed to create thread pool: {e}")))?;

        log::info!(
            "Searching {} candidates x {} folds on {workers} workers ({})",
            candidates.len(),
            folds.len(),
            self.config.scoring
        );

        pool.install(|| {
            let analyzer = MessageAnalyzer::with_config(self.analyzer.clone())?;
            let tokens = TextPipeline::analyze_all(&analyzer, texts)?;

            let units: Vec<(usize, usize)> = (0..candidates.len())
                .flat_map(|c| (0..folds.len()).map(move |f| (c, f)))
                .collect();
            let unit_results: Vec<Result<f64>> = units
                .par_iter()
                .map(|&(c, f)| {
                    let (train, validation) = &folds[f];
                    self.score_fold(&candidates[c], &tokens, labels, categories, train, validation)
                })
                .collect();

            let mut first_error = None;
            let mut unit_results = unit_results.into_iter();
            let scores: Vec<CandidateScore> = candidates
                .iter()
                .map(|candidate| {
                    let mut fold_scores = Vec::with_capacity(folds.len());
                    let mut error = None;
                    for result in unit_results.by_ref().take(folds.len()) {
                        match result {
                            Ok(score) => fold_scores.push(score),
                            Err(e) => {
                                error.get_or_insert_with(|| e.to_string());
                                first_error.get_or_insert(e);
                            }
                        }
                    }

                    let mean_score = match &error {
                        Some(e) => {
                            log::warn!("Candidate failed ({e}): {candidate}");
                            0.0
                        }
                        None => fold_scores.iter().sum::<f64>() / fold_scores.len() as f64,
                    };
                    log::debug!("{mean_score:.4} {candidate}");
                    CandidateScore {
                        candidate: candidate.clone(),
                        fold_scores,
                        mean_score,
                        error,
                    }
                })
                .collect();

            let best_index = match best_candidate(&scores) {
                Some(index) => index,
                None => {
                    return Err(first_error.unwrap_or_else(|| {
                        TriageError::internal("grid search produced no candidates")
                    }));
                }
            };
            let best = &scores[best_index];
            log::info!(
                "Best {} {:.4}: {}",
                self.config.scoring,
                best.mean_score,
                best.candidate
            );

            let mut pipeline = TextPipeline::new(
                self.analyzer.clone(),
                best.candidate.vectorizer.clone(),
                best.candidate.forest.clone(),
            )?;
            pipeline.fit_tokens(&tokens, labels, categories)?;
            pipeline.record_search(self.config.scoring, best.mean_score);

            let report = SearchReport {
                scoring: self.config.scoring,
                folds: folds.len(),
                best_index,
                scores,
            };
            Ok((pipeline, report))
        })
    }

    fn score_fold(
        &self,
        candidate: &Candidate,
        tokens: &[Vec<String>],
        labels: &LabelMatrix,
        categories: &CategorySet,
        train: &[usize],
        validation: &[usize],
    ) -> Result<f64> {
        let train_tokens: Vec<&[String]> = train.iter().map(|&i| tokens[i].as_slice()).collect();
        let validation_tokens: Vec<&[String]> =
            validation.iter().map(|&i| tokens[i].as_slice()).collect();

        let mut vectorizer = TfidfVectorizer::new(candidate.vectorizer.clone())?;
        let train_features = vectorizer.fit_transform(&train_tokens)?;
        let mut classifier = MultiOutputClassifier::new(candidate.forest.clone())?;
        classifier.fit(&train_features, &labels.select_rows(train), categories)?;

        let predicted = classifier.predict(&vectorizer.transform(&validation_tokens)?)?;
        self.config
            .scoring
            .score(&labels.select_rows(validation), &predicted)
    }
}

/// Index of the highest mean score among the candidates that fitted on
/// every fold; the earliest candidate wins ties.
fn best_candidate(scores: &[CandidateScore]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (i, score) in scores.iter().enumerate() {
        if score.failed() {
            continue;
        }
        match best {
            Some(b) if scores[b].mean_score >= score.mean_score => {}
            _ => best = Some(i),
        }
    }
    best
}

/// Build a fitted pipeline from a training split: grid search when enabled,
/// otherwise a direct fit of the configured defaults.
pub fn train_pipeline(
    config: &TrainingConfig,
    train: &Dataset,
) -> Result<(TextPipeline, Option<SearchReport>)> {
    config.validate()?;
    let texts = train.texts();

    if config.search.enabled {
        let search = GridSearch::new(
            config.search.clone(),
            config.analyzer.clone(),
            config.forest.clone(),
        )?;
        let (pipeline, report) = search.fit(&texts, train.labels(), train.categories())?;
        return Ok((pipeline, Some(report)));
    }

    let mut pipeline = TextPipeline::new(
        config.analyzer.clone(),
        config.vectorizer.clone(),
        config.forest.clone(),
    )?;
    pipeline.fit(&texts, train.labels(), train.categories())?;
    Ok((pipeline, None))
}
