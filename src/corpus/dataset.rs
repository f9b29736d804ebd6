//! In-memory labeled corpus, hold-out splitting and k-fold indices.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;

use crate::config::SplitConfig;
use crate::corpus::labels::{CategorySet, LabelMatrix};
use crate::corpus::message::Message;
use crate::error::{Result, TriageError};

/// Messages with their labels against a category set.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    messages: Vec<Message>,
    labels: LabelMatrix,
    categories: CategorySet,
}

impl Dataset {
    /// Create a dataset. Labels must have one row per message and one column
    /// per category.
    pub fn new(messages: Vec<Message>, labels: LabelMatrix, categories: CategorySet) -> Result<Self> {
        if labels.n_rows() != messages.len() {
            return Err(TriageError::shape_mismatch(format!(
                "{} messages but {} label rows",
                messages.len(),
                labels.n_rows()
            )));
        }
        if labels.n_cols() != categories.len() {
            return Err(TriageError::shape_mismatch(format!(
                "{} categories but {} label columns",
                categories.len(),
                labels.n_cols()
            )));
        }

        Ok(Dataset {
            messages,
            labels,
            categories,
        })
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn labels(&self) -> &LabelMatrix {
        &self.labels
    }

    pub fn categories(&self) -> &CategorySet {
        &self.categories
    }

    /// Message bodies in row order.
    pub fn texts(&self) -> Vec<&str> {
        self.messages.iter().map(Message::text).collect()
    }

    /// Copy the given rows into a new dataset.
    pub fn subset(&self, indices: &[usize]) -> Dataset {
        Dataset {
            messages: indices.iter().map(|&i| self.messages[i].clone()).collect(),
            labels: self.labels.select_rows(indices),
            categories: self.categories.clone(),
        }
    }

    /// Shuffle the rows with a seeded RNG and split them into a training and
    /// a test set.
    ///
    /// The test set gets `ceil(test_size * len)` rows; both sides must end up
    /// non-empty.
    pub fn train_test_split(&self, config: &SplitConfig) -> Result<(Dataset, Dataset)> {
        config.validate()?;

        let n = self.len();
        let n_test = (config.test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(TriageError::invalid_argument(format!(
                "cannot split {n} rows with test_size {}",
                config.test_size
            )));
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(config.seed);
        indices.shuffle(&mut rng);

        let (test, train) = indices.split_at(n_test);
        Ok((self.subset(train), self.subset(test)))
    }
}

/// Train/validation index pairs of an unshuffled k-fold split.
///
/// Folds are contiguous; the first `n % k` folds get one extra row.
pub fn k_fold_indices(n: usize, k: usize) -> Result<Vec<(Vec<usize>, Vec<usize>)>> {
    if k < 2 {
        return Err(TriageError::invalid_argument(format!(
            "k-fold needs at least 2 folds, got {k}"
        )));
    }
    if k > n {
        return Err(TriageError::invalid_argument(format!(
            "cannot split {n} rows into {k} folds"
        )));
    }

    let base = n / k;
    let extra = n % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;

    for fold in 0..k {
        let size = base + usize::from(fold < extra);
        let end = start + size;
        let validation: Vec<usize> = (start..end).collect();
        let train: Vec<usize> = (0..start).chain(end..n).collect();
        folds.push((train, validation));
        start = end;
    }

    Ok(folds)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset(n: usize) -> Dataset {
        let messages = (0..n)
            .map(|i| Message::new(i as i64, format!("message {i}")))
            .collect();
        let rows = (0..n).map(|i| vec![(i % 2) as u8]).collect();
        Dataset::new(
            messages,
            LabelMatrix::from_rows(rows, 1).unwrap(),
            CategorySet::new(["related"]).unwrap(),
        )
        .unwrap()
    }

    #[test]
    fn test_shape_checks() {
        let result = Dataset::new(
            vec![Message::new(1, "help")],
            LabelMatrix::zeros(2, 1),
            CategorySet::new(["related"]).unwrap(),
        );
        assert!(matches!(result, Err(TriageError::ShapeMismatch(_))));
    }

    #[test]
    fn test_train_test_split() {
        let data = dataset(10);
        let (train, test) = data.train_test_split(&SplitConfig::default()).unwrap();

        assert_eq!(train.len(), 8);
        assert_eq!(test.len(), 2);

        let mut ids: Vec<i64> = train
            .messages()
            .iter()
            .chain(test.messages())
            .map(Message::id)
            .collect();
        ids.sort();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());

        // Labels travel with their messages.
        for (i, message) in test.messages().iter().enumerate() {
            assert_eq!(test.labels().get(i, 0) as i64, message.id() % 2);
        }
    }

    #[test]
    fn test_train_test_split_is_seeded() {
        let data = dataset(20);
        let config = SplitConfig {
            test_size: 0.25,
            seed: 7,
        };

        let (a, _) = data.train_test_split(&config).unwrap();
        let (b, _) = data.train_test_split(&config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_split_too_small() {
        let data = dataset(1);
        assert!(data.train_test_split(&SplitConfig::default()).is_err());
    }

    #[test]
    fn test_k_fold_indices() {
        let folds = k_fold_indices(7, 3).unwrap();

        assert_eq!(folds.len(), 3);
        assert_eq!(folds[0].1, vec![0, 1, 2]);
        assert_eq!(folds[1].1, vec![3, 4]);
        assert_eq!(folds[2].1, vec![5, 6]);
        assert_eq!(folds[1].0, vec![0, 1, 2, 5, 6]);
    }

    #[test]
    fn test_k_fold_rejects_bad_counts() {
        assert!(k_fold_indices(3, 5).is_err());
        assert!(k_fold_indices(10, 1).is_err());
    }
}
