//! One independent binary model per category.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::error::{Result, TriageError};
use crate::features::sparse::SparseMatrix;
use crate::ml::forest::{ForestConfig, RandomForest};

/// The fitted model of a single label column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LabelModel {
    /// A random forest.
    Forest(RandomForest),
    /// Trivial predictor for a column that was constant during training.
    Constant { value: u8 },
}

impl LabelModel {
    /// Positive probability of every row.
    pub fn predict_proba(&self, features: &SparseMatrix) -> Result<Vec<f64>> {
        match self {
            LabelModel::Forest(forest) => forest.predict_proba(features),
            LabelModel::Constant { value } => Ok(vec![f64::from(*value); features.n_rows()]),
        }
    }

    /// Hard 0/1 prediction of every row.
    pub fn predict(&self, features: &SparseMatrix) -> Result<Vec<u8>> {
        match self {
            LabelModel::Forest(forest) => forest.predict(features),
            LabelModel::Constant { value } => Ok(vec![*value; features.n_rows()]),
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, LabelModel::Constant { .. })
    }
}

/// Wraps the forest so that every category gets its own model over the
/// shared feature matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputClassifier {
    config: ForestConfig,
    categories: Option<CategorySet>,
    models: Vec<LabelModel>,
    n_features: usize,
}

impl MultiOutputClassifier {
    /// Create an unfitted classifier.
    pub fn new(config: ForestConfig) -> Result<Self> {
        config.validate()?;
        Ok(MultiOutputClassifier {
            config,
            categories: None,
            models: Vec::new(),
            n_features: 0,
        })
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.categories.is_some()
    }

    /// Fit one model per label column, in parallel.
    ///
    /// A column with a single value over the training rows gets a
    /// [`LabelModel::Constant`] and is reported by
    /// [`degenerate_labels`](Self::degenerate_labels).
    pub fn fit(
        &mut self,
        features: &SparseMatrix,
        labels: &LabelMatrix,
        categories: &CategorySet,
    ) -> Result<()> {
        if features.n_rows() != labels.n_rows() {
            return Err(TriageError::shape_mismatch(format!(
                "{} feature rows but {} label rows",
                features.n_rows(),
                labels.n_rows()
            )));
        }
        if labels.n_cols() != categories.len() {
            return Err(TriageError::shape_mismatch(format!(
                "{} label columns but {} categories",
                labels.n_cols(),
                categories.len()
            )));
        }
        if features.n_rows() == 0 {
            return Err(TriageError::invalid_argument(
                "cannot fit a classifier on zero rows",
            ));
        }

        let n_rows = labels.n_rows();
        let models = (0..labels.n_cols())
            .into_par_iter()
            .map(|col| {
                let column = labels.column(col);
                let positives = labels.column_sum(col);
                if positives == 0 || positives == n_rows {
                    return Ok(LabelModel::Constant {
                        value: u8::from(positives == n_rows),
                    });
                }
                RandomForest::fit(features, &column, &self.config, col).map(LabelModel::Forest)
            })
            .collect::<Result<Vec<_>>>()?;

        for (name, model) in categories.iter().zip(&models) {
            if let LabelModel::Constant { value } = model {
                log::debug!("Category '{name}' is constant ({value}), using a constant model");
            }
        }

        self.models = models;
        self.categories = Some(categories.clone());
        self.n_features = features.n_cols();
        Ok(())
    }

    /// Predict every category for every row.
    pub fn predict(&self, features: &SparseMatrix) -> Result<LabelMatrix> {
        self.check_features(features)?;
        let columns = self
            .models
            .par_iter()
            .map(|model| model.predict(features))
            .collect::<Result<Vec<_>>>()?;
        LabelMatrix::from_columns(columns, features.n_rows())
    }

    /// Positive probability per category (outer) and row (inner).
    pub fn predict_proba(&self, features: &SparseMatrix) -> Result<Vec<Vec<f64>>> {
        self.check_features(features)?;
        self.models
            .par_iter()
            .map(|model| model.predict_proba(features))
            .collect()
    }

    fn check_features(&self, features: &SparseMatrix) -> Result<()> {
        if !self.is_fitted() {
            return Err(TriageError::not_fitted(
                "classifier must be fitted before predict",
            ));
        }
        if features.n_cols() != self.n_features {
            return Err(TriageError::shape_mismatch(format!(
                "classifier was fitted on {} features, got {}",
                self.n_features,
                features.n_cols()
            )));
        }
        Ok(())
    }

    /// Categories the classifier was fitted on.
    pub fn categories(&self) -> Option<&CategorySet> {
        self.categories.as_ref()
    }

    /// Model of a category, by name.
    pub fn model(&self, category: &str) -> Option<&LabelModel> {
        let index = self.categories.as_ref()?.index_of(category)?;
        self.models.get(index)
    }

    pub fn models(&self) -> &[LabelModel] {
        &self.models
    }

    /// Names of the categories that were constant during training.
    pub fn degenerate_labels(&self) -> Vec<&str> {
        let Some(categories) = &self.categories else {
            return Vec::new();
        };
        categories
            .iter()
            .zip(&self.models)
            .filter(|(_, model)| model.is_constant())
            .map(|(name, _)| name)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sparse::SparseRow;

    fn small_config() -> ForestConfig {
        ForestConfig {
            n_estimators: 8,
            ..ForestConfig::default()
        }
    }

    fn features() -> SparseMatrix {
        let rows = (0..12)
            .map(|i| SparseRow::from_pairs(vec![(i % 3, 1.0), (3, 0.25)]))
            .collect();
        SparseMatrix::from_rows(rows, 4).unwrap()
    }

    #[test]
    fn test_fit_predict_shape() {
        let features = features();
        let rows = (0..12)
            .map(|i| vec![u8::from(i % 3 == 0), u8::from(i % 3 == 1), 0])
            .collect();
        let labels = LabelMatrix::from_rows(rows, 3).unwrap();
        let categories = CategorySet::new(["water", "food", "fire"]).unwrap();

        let mut classifier = MultiOutputClassifier::new(small_config()).unwrap();
        classifier.fit(&features, &labels, &categories).unwrap();
        let predicted = classifier.predict(&features).unwrap();

        assert_eq!(predicted.n_rows(), 12);
        assert_eq!(predicted.n_cols(), 3);
        assert_eq!(predicted, labels);
    }

    #[test]
    fn test_degenerate_column() {
        let features = features();
        let rows = (0..12).map(|i| vec![u8::from(i % 2 == 0), 0, 1]).collect();
        let labels = LabelMatrix::from_rows(rows, 3).unwrap();
        let categories = CategorySet::new(["related", "child_alone", "aid"]).unwrap();

        let mut classifier = MultiOutputClassifier::new(small_config()).unwrap();
        classifier.fit(&features, &labels, &categories).unwrap();

        assert_eq!(classifier.degenerate_labels(), vec!["child_alone", "aid"]);
        assert_eq!(
            classifier.model("child_alone"),
            Some(&LabelModel::Constant { value: 0 })
        );

        let predicted = classifier.predict(&features).unwrap();
        assert_eq!(predicted.column(1), vec![0; 12]);
        assert_eq!(predicted.column(2), vec![1; 12]);
    }

    #[test]
    fn test_not_fitted() {
        let classifier = MultiOutputClassifier::new(small_config()).unwrap();
        assert!(matches!(
            classifier.predict(&features()),
            Err(TriageError::NotFitted(_))
        ));
    }

    #[test]
    fn test_row_count_mismatch() {
        let labels = LabelMatrix::zeros(5, 1);
        let categories = CategorySet::new(["related"]).unwrap();

        let mut classifier = MultiOutputClassifier::new(small_config()).unwrap();
        let result = classifier.fit(&features(), &labels, &categories);
        assert!(matches!(result, Err(TriageError::ShapeMismatch(_))));
    }
}
