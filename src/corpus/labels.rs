//! Category names and binary label matrices.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// Ordered, duplicate-free list of category names.
///
/// The position of a name is its column in every [`LabelMatrix`] built
/// against this set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet {
    names: Vec<String>,
}

impl CategorySet {
    /// Create a category set, rejecting empty or repeated names.
    pub fn new<I, S>(names: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();

        let mut seen = ahash::AHashSet::with_capacity(names.len());
        for name in &names {
            if name.trim().is_empty() {
                return Err(TriageError::data("category name must not be empty"));
            }
            if !seen.insert(name.as_str()) {
                return Err(TriageError::data(format!("duplicate category '{name}'")));
            }
        }

        Ok(CategorySet { names })
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Get the name at a column index.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    /// Get the column index of a name.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

/// Dense row-major matrix of binary labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelMatrix {
    n_rows: usize,
    n_cols: usize,
    data: Vec<u8>,
}

impl LabelMatrix {
    /// Create an all-zero matrix.
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        LabelMatrix {
            n_rows,
            n_cols,
            data: vec![0; n_rows * n_cols],
        }
    }

    /// Build a matrix from rows. All rows must have `n_cols` values in {0, 1}.
    pub fn from_rows(rows: Vec<Vec<u8>>, n_cols: usize) -> Result<Self> {
        let n_rows = rows.len();
        let mut data = Vec::with_capacity(n_rows * n_cols);

        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(TriageError::shape_mismatch(format!(
                    "label row {i} has {} values, expected {n_cols}",
                    row.len()
                )));
            }
            if let Some(v) = row.iter().find(|&&v| v > 1) {
                return Err(TriageError::data(format!(
                    "label row {i} contains non-binary value {v}"
                )));
            }
            data.extend(row);
        }

        Ok(LabelMatrix {
            n_rows,
            n_cols,
            data,
        })
    }

    /// Build a matrix from columns of equal length.
    pub fn from_columns(columns: Vec<Vec<u8>>, n_rows: usize) -> Result<Self> {
        let n_cols = columns.len();
        let mut matrix = LabelMatrix::zeros(n_rows, n_cols);

        for (j, column) in columns.iter().enumerate() {
            if column.len() != n_rows {
                return Err(TriageError::shape_mismatch(format!(
                    "label column {j} has {} values, expected {n_rows}",
                    column.len()
                )));
            }
            for (i, &value) in column.iter().enumerate() {
                matrix.set(i, j, value);
            }
        }

        Ok(matrix)
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.data[row * self.n_cols + col]
    }

    /// Set a value; anything non-zero is stored as 1.
    pub fn set(&mut self, row: usize, col: usize, value: u8) {
        self.data[row * self.n_cols + col] = u8::from(value != 0);
    }

    pub fn row(&self, row: usize) -> &[u8] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }

    /// Copy out one column.
    pub fn column(&self, col: usize) -> Vec<u8> {
        (0..self.n_rows).map(|i| self.get(i, col)).collect()
    }

    /// Copy the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> LabelMatrix {
        let mut data = Vec::with_capacity(indices.len() * self.n_cols);
        for &i in indices {
            data.extend_from_slice(self.row(i));
        }
        LabelMatrix {
            n_rows: indices.len(),
            n_cols: self.n_cols,
            data,
        }
    }

    /// Number of ones in a column.
    pub fn column_sum(&self, col: usize) -> usize {
        (0..self.n_rows).filter(|&i| self.get(i, col) == 1).count()
    }

    /// Check that another matrix has the same shape.
    pub fn check_same_shape(&self, other: &LabelMatrix) -> Result<()> {
        if self.n_rows != other.n_rows || self.n_cols != other.n_cols {
            return Err(TriageError::shape_mismatch(format!(
                "label matrices differ: {}x{} vs {}x{}",
                self.n_rows, self.n_cols, other.n_rows, other.n_cols
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_set() {
        let categories = CategorySet::new(["related", "request", "offer"]).unwrap();

        assert_eq!(categories.len(), 3);
        assert_eq!(categories.get(1), Some("request"));
        assert_eq!(categories.index_of("offer"), Some(2));
        assert_eq!(categories.index_of("water"), None);
    }

    #[test]
    fn test_category_set_rejects_duplicates() {
        assert!(CategorySet::new(["food", "water", "food"]).is_err());
        assert!(CategorySet::new(["food", " "]).is_err());
    }

    #[test]
    fn test_label_matrix_rows_and_columns() {
        let labels =
            LabelMatrix::from_rows(vec![vec![1, 0], vec![0, 1], vec![1, 1], vec![0, 0]], 2)
                .unwrap();

        assert_eq!(labels.n_rows(), 4);
        assert_eq!(labels.row(2), &[1, 1]);
        assert_eq!(labels.column(0), vec![1, 0, 1, 0]);
        assert_eq!(labels.column_sum(1), 2);

        let selected = labels.select_rows(&[3, 0]);
        assert_eq!(selected.row(0), &[0, 0]);
        assert_eq!(selected.row(1), &[1, 0]);
    }

    #[test]
    fn test_label_matrix_from_columns() {
        let labels = LabelMatrix::from_columns(vec![vec![1, 0, 1], vec![0, 0, 1]], 3).unwrap();
        assert_eq!(labels.row(2), &[1, 1]);

        assert!(LabelMatrix::from_columns(vec![vec![1, 0]], 3).is_err());
    }

    #[test]
    fn test_label_matrix_validation() {
        assert!(LabelMatrix::from_rows(vec![vec![1, 0], vec![1]], 2).is_err());
        assert!(LabelMatrix::from_rows(vec![vec![2, 0]], 2).is_err());
    }
}
