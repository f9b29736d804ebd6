//! Compressed sparse rows of feature weights.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TriageError};

/// One row of a sparse matrix: column indices in ascending order with their
/// non-zero values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseRow {
    indices: Vec<usize>,
    values: Vec<f64>,
}

impl SparseRow {
    /// Build a row from `(column, value)` pairs in any order.
    ///
    /// Zero values are dropped; repeated columns are summed.
    pub fn from_pairs<I: IntoIterator<Item = (usize, f64)>>(pairs: I) -> Self {
        let mut pairs: Vec<(usize, f64)> = pairs.into_iter().collect();
        pairs.sort_by_key(|&(col, _)| col);

        let mut row = SparseRow::default();
        for (col, value) in pairs {
            match row.indices.last() {
                Some(&last) if last == col => {
                    if let Some(v) = row.values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    row.indices.push(col);
                    row.values.push(value);
                }
            }
        }
        row.retain_non_zero();
        row
    }

    fn retain_non_zero(&mut self) {
        if self.values.iter().all(|&v| v != 0.0) {
            return;
        }
        let (indices, values) = self
            .indices
            .iter()
            .zip(&self.values)
            .filter(|&(_, &v)| v != 0.0)
            .map(|(&i, &v)| (i, v))
            .unzip();
        self.indices = indices;
        self.values = values;
    }

    /// Value at a column, zero when absent.
    pub fn get(&self, col: usize) -> f64 {
        match self.indices.binary_search(&col) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Number of stored (non-zero) entries.
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Euclidean norm of the row.
    pub fn norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Scale the row to unit Euclidean norm. All-zero rows are left as is.
    pub fn l2_normalize(&mut self) {
        let norm = self.norm();
        if norm > 0.0 {
            for value in &mut self.values {
                *value /= norm;
            }
        }
    }
}

/// Row-major sparse matrix with a fixed number of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SparseMatrix {
    n_cols: usize,
    rows: Vec<SparseRow>,
}

impl SparseMatrix {
    /// Create an empty matrix with `n_cols` columns.
    pub fn new(n_cols: usize) -> Self {
        SparseMatrix {
            n_cols,
            rows: Vec::new(),
        }
    }

    /// Build a matrix from rows, checking every column index.
    pub fn from_rows(rows: Vec<SparseRow>, n_cols: usize) -> Result<Self> {
        let mut matrix = SparseMatrix::new(n_cols);
        for row in rows {
            matrix.push_row(row)?;
        }
        Ok(matrix)
    }

    /// Append a row.
    pub fn push_row(&mut self, row: SparseRow) -> Result<()> {
        if let Some(&max) = row.indices.last() {
            if max >= self.n_cols {
                return Err(TriageError::shape_mismatch(format!(
                    "column {max} out of range for {} columns",
                    self.n_cols
                )));
            }
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    pub fn row(&self, index: usize) -> &SparseRow {
        &self.rows[index]
    }

    pub fn rows(&self) -> &[SparseRow] {
        &self.rows
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.rows[row].get(col)
    }

    /// Total number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.iter().map(SparseRow::nnz).sum()
    }

    /// Copy the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> SparseMatrix {
        SparseMatrix {
            n_cols: self.n_cols,
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        }
    }

    /// Expand into a dense row-major matrix.
    pub fn to_dense(&self) -> Vec<Vec<f64>> {
        self.rows
            .iter()
            .map(|row| {
                let mut dense = vec![0.0; self.n_cols];
                for (col, value) in row.iter() {
                    dense[col] = value;
                }
                dense
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_from_pairs() {
        let row = SparseRow::from_pairs(vec![(4, 1.0), (1, 2.0), (4, 0.5), (2, 0.0)]);

        assert_eq!(row.indices(), &[1, 4]);
        assert_eq!(row.values(), &[2.0, 1.5]);
        assert_eq!(row.get(4), 1.5);
        assert_eq!(row.get(3), 0.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut row = SparseRow::from_pairs(vec![(0, 3.0), (2, 4.0)]);
        row.l2_normalize();

        assert!((row.get(0) - 0.6).abs() < 1e-12);
        assert!((row.get(2) - 0.8).abs() < 1e-12);
        assert!((row.norm() - 1.0).abs() < 1e-12);

        let mut empty = SparseRow::default();
        empty.l2_normalize();
        assert_eq!(empty.nnz(), 0);
    }

    #[test]
    fn test_matrix() {
        let matrix = SparseMatrix::from_rows(
            vec![
                SparseRow::from_pairs(vec![(0, 1.0)]),
                SparseRow::default(),
                SparseRow::from_pairs(vec![(1, 2.0), (2, 3.0)]),
            ],
            3,
        )
        .unwrap();

        assert_eq!(matrix.n_rows(), 3);
        assert_eq!(matrix.nnz(), 3);
        assert_eq!(matrix.get(2, 2), 3.0);
        assert_eq!(matrix.to_dense()[0], vec![1.0, 0.0, 0.0]);

        let selected = matrix.select_rows(&[2, 0]);
        assert_eq!(selected.get(0, 1), 2.0);
        assert_eq!(selected.get(1, 0), 1.0);
    }

    #[test]
    fn test_column_out_of_range() {
        let result = SparseMatrix::from_rows(vec![SparseRow::from_pairs(vec![(5, 1.0)])], 3);
        assert!(matches!(result, Err(TriageError::ShapeMismatch(_))));
    }
}
