//! Classifier capability consumed by the dispatcher

use crate::error::InferenceError;
use crate::feature_encoder::FeatureVector;

/// Row-major matrix of named numeric columns
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    data: Vec<f64>,
    n_rows: usize,
}

impl FeatureMatrix {
    /// Build from rows. Every row must have one value per column.
    pub fn new(columns: Vec<String>, rows: &[Vec<f64>]) -> Result<Self, InferenceError> {
        let n_cols = columns.len();
        let mut data = Vec::with_capacity(rows.len() * n_cols);

        for (row, values) in rows.iter().enumerate() {
            if values.len() != n_cols {
                return Err(InferenceError::RaggedRow {
                    row,
                    expected: n_cols,
                    found: values.len(),
                });
            }
            data.extend_from_slice(values);
        }

        Ok(Self {
            columns,
            data,
            n_rows: rows.len(),
        })
    }

    /// Single-row matrix from an encoded transaction
    pub fn from_vector(features: &FeatureVector) -> Self {
        Self {
            columns: features.columns().to_vec(),
            data: features.values().to_vec(),
            n_rows: 1,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    pub fn row(&self, idx: usize) -> Option<&[f64]> {
        if idx >= self.n_rows {
            return None;
        }
        let n_cols = self.n_cols();
        Some(&self.data[idx * n_cols..(idx + 1) * n_cols])
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Values narrowed to `f32` for runtimes that take float tensors
    pub fn to_f32(&self) -> Vec<f32> {
        self.data.iter().map(|&v| v as f32).collect()
    }
}

/// A trained binary classifier.
///
/// `predict` returns one label per matrix row, in row order. Implementations
/// must be safe to call from several requests at once.
pub trait Classifier: Send + Sync {
    fn name(&self) -> &str;

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<i64>, InferenceError>;
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_encoder::FeatureEncoder;
    use crate::types::transaction::sample_transaction;

    #[test]
    fn test_matrix_from_vector() {
        let features = FeatureEncoder::default()
            .encode(&sample_transaction())
            .unwrap();
        let matrix = FeatureMatrix::from_vector(&features);

        assert_eq!(matrix.n_rows(), 1);
        assert_eq!(matrix.n_cols(), 53);
        assert_eq!(matrix.row(0), Some(features.values()));
        assert!(matrix.row(1).is_none());
    }

    #[test]
    fn test_matrix_rejects_ragged_rows() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec![1.0, 2.0], vec![3.0]];

        assert!(matches!(
            FeatureMatrix::new(columns, &rows),
            Err(InferenceError::RaggedRow {
                row: 1,
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_matrix_row_major() {
        let columns = vec!["a".to_string(), "b".to_string()];
        let rows = vec![vec![1.0, 2.0], vec![3.0, 4.0]];
        let matrix = FeatureMatrix::new(columns, &rows).unwrap();

        assert_eq!(matrix.data(), &[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(matrix.row(1), Some(&[3.0, 4.0][..]));
        assert_eq!(matrix.to_f32(), vec![1.0_f32, 2.0, 3.0, 4.0]);
    }
}
