//! Boundary to the trained classifier.

mod linear;

pub use linear::{LinearModelArtifact, LinearOracle};

use super::domain::{PredictionLabel, PredictionResult};
use super::error::ScoringError;
use super::features::{FeatureValue, FeatureVector};

/// Row-major model input in the oracle's declared column order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    columns: Vec<String>,
    rows: Vec<Vec<FeatureValue>>,
}

impl FeatureMatrix {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<FeatureValue>>) -> Self {
        Self { columns, rows }
    }

    pub fn from_vectors(columns: Vec<String>, vectors: Vec<FeatureVector>) -> Self {
        let rows = vectors.into_iter().map(FeatureVector::into_values).collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<FeatureValue>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Opaque trained classifier. Implementations score whole matrices at once.
pub trait ScoringOracle: Send + Sync {
    /// Input column order the model was trained on. Fixed for the oracle's lifetime.
    fn columns(&self) -> &[String];

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionLabel>, ScoringError>;

    /// Probability of the positive class per row.
    fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError>;
}

/// One `predict` and one `predict_proba` call for the whole matrix, checked for row
/// alignment and probability range.
pub fn score_matrix(
    oracle: &dyn ScoringOracle,
    matrix: &FeatureMatrix,
) -> Result<Vec<PredictionResult>, ScoringError> {
    let labels = oracle.predict(matrix)?;
    let probabilities = oracle.predict_proba(matrix)?;

    if labels.len() != matrix.len() || probabilities.len() != matrix.len() {
        return Err(ScoringError::RowCountMismatch {
            rows: matrix.len(),
            labels: labels.len(),
            probabilities: probabilities.len(),
        });
    }

    labels
        .into_iter()
        .zip(probabilities)
        .enumerate()
        .map(|(row, (label, probability))| {
            if !(0.0..=1.0).contains(&probability) {
                return Err(ScoringError::ProbabilityOutOfRange {
                    row: row + 1,
                    value: probability,
                });
            }
            Ok(PredictionResult { label, probability })
        })
        .collect()
}

/// Reject rows whose width differs from the declared column count.
pub(crate) fn check_shape(expected: usize, matrix: &FeatureMatrix) -> Result<(), ScoringError> {
    if matrix.columns().len() != expected {
        return Err(ScoringError::ColumnCountMismatch {
            expected,
            actual: matrix.columns().len(),
        });
    }

    match matrix
        .rows()
        .iter()
        .position(|row| row.len() != expected)
    {
        Some(position) => Err(ScoringError::ShapeMismatch {
            expected,
            actual: matrix.rows()[position].len(),
            row: position + 1,
        }),
        None => Ok(()),
    }
}
