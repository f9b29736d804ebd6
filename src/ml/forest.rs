//! Random forest of decision trees for one binary label.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};
use crate::features::sparse::{SparseMatrix, SparseRow};
use crate::ml::tree::{DecisionTree, TreeParams};

/// How many features each split may examine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaxFeatures {
    /// Square root of the feature count.
    Sqrt,
    /// Base-2 logarithm of the feature count.
    Log2,
    /// Every feature.
    All,
    /// A fixed number of features.
    Count(usize),
    /// A fraction of the feature count.
    Fraction(f64),
}

impl MaxFeatures {
    /// Resolve to a feature count in `1..=n_features`.
    pub fn resolve(&self, n_features: usize) -> usize {
        let n = n_features as f64;
        let count = match *self {
            MaxFeatures::Sqrt => n.sqrt() as usize,
            MaxFeatures::Log2 => n.log2() as usize,
            MaxFeatures::All => n_features,
            MaxFeatures::Count(count) => count,
            MaxFeatures::Fraction(fraction) => (fraction * n) as usize,
        };
        count.clamp(1, n_features.max(1))
    }
}

/// Random forest settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_estimators: usize,
    pub min_samples_split: usize,
    /// `None` grows every tree until its leaves are pure.
    pub max_depth: Option<usize>,
    pub max_features: MaxFeatures,
    /// Fit each tree on a bootstrap sample of the rows.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            min_samples_split: 2,
            max_depth: None,
            max_features: MaxFeatures::Sqrt,
            bootstrap: true,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_estimators == 0 {
            return Err(TriageError::invalid_config("n_estimators must be positive"));
        }
        if self.min_samples_split < 2 {
            return Err(TriageError::invalid_config(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.max_depth == Some(0) {
            return Err(TriageError::invalid_config("max_depth must be positive"));
        }
        match self.max_features {
            MaxFeatures::Count(0) => {
                return Err(TriageError::invalid_config("max_features must be positive"));
            }
            MaxFeatures::Fraction(f) if !(f > 0.0 && f <= 1.0) => {
                return Err(TriageError::invalid_config(format!(
                    "max_features fraction must be in (0, 1], got {f}"
                )));
            }
            _ => {}
        }
        Ok(())
    }
}

/// Derive an independent seed for one tree of one label.
///
/// Seeds depend only on their coordinates, never on scheduling.
pub fn tree_seed(seed: u64, label: usize, tree: usize) -> u64 {
    let mut z = seed
        ^ (label as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ (tree as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
    // splitmix64 finalizer
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Bagged ensemble of decision trees.
///
/// Predicts 1 when the mean positive probability over the trees exceeds 0.5.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit a forest on one label column.
    ///
    /// `stream` separates the seed sequences of forests sharing a config,
    /// such as the per-label forests of a multi-output model.
    pub fn fit(
        features: &SparseMatrix,
        labels: &[u8],
        config: &ForestConfig,
        stream: usize,
    ) -> Result<Self> {
        config.validate()?;
        let n_rows = features.n_rows();
        if labels.len() != n_rows {
            return Err(TriageError::shape_mismatch(format!(
                "{n_rows} feature rows but {} labels",
                labels.len()
            )));
        }
        if n_rows == 0 {
            return Err(TriageError::invalid_argument(
                "cannot fit a forest on zero rows",
            ));
        }

        let params = TreeParams {
            max_depth: config.max_depth,
            min_samples_split: config.min_samples_split,
            max_features: config.max_features.resolve(features.n_cols()),
        };

        let trees = (0..config.n_estimators)
            .into_par_iter()
            .map(|t| {
                let mut rng = StdRng::seed_from_u64(tree_seed(config.seed, stream, t));
                let samples: Vec<usize> = if config.bootstrap {
                    (0..n_rows).map(|_| rng.random_range(0..n_rows)).collect()
                } else {
                    (0..n_rows).collect()
                };
                DecisionTree::fit(features, labels, &samples, &params, &mut rng)
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RandomForest {
            trees,
            n_features: features.n_cols(),
        })
    }

    /// Mean positive probability of one row over all trees.
    pub fn predict_row(&self, row: &SparseRow) -> f64 {
        let sum: f64 = self.trees.iter().map(|tree| tree.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    /// Positive probability of every row.
    pub fn predict_proba(&self, features: &SparseMatrix) -> Result<Vec<f64>> {
        self.check_features(features)?;
        Ok(features
            .rows()
            .iter()
            .map(|row| self.predict_row(row))
            .collect())
    }

    /// Hard 0/1 prediction of every row.
    pub fn predict(&self, features: &SparseMatrix) -> Result<Vec<u8>> {
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p > 0.5))
            .collect())
    }

    fn check_features(&self, features: &SparseMatrix) -> Result<()> {
        if features.n_cols() != self.n_features {
            return Err(TriageError::shape_mismatch(format!(
                "forest was fitted on {} features, got {}",
                self.n_features,
                features.n_cols()
            )));
        }
        Ok(())
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}
