use super::{check_shape, FeatureMatrix, ScoringOracle};
use crate::scoring::domain::{format_number, PredictionLabel};
use crate::scoring::error::{ModelLoadError, ScoringError};
use crate::scoring::features::FeatureValue;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;
use tracing::info;

fn default_threshold() -> f64 {
    0.5
}

/// Serialized logistic model: an intercept, numeric weights, and per-category weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModelArtifact {
    pub columns: Vec<String>,
    pub intercept: f64,
    #[serde(default)]
    pub weights: BTreeMap<String, f64>,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

/// Logistic oracle backed by a [`LinearModelArtifact`].
#[derive(Debug, Clone)]
pub struct LinearOracle {
    artifact: LinearModelArtifact,
}

impl LinearOracle {
    pub fn from_artifact(artifact: LinearModelArtifact) -> Result<Self, ModelLoadError> {
        if artifact.columns.is_empty() {
            return Err(ModelLoadError::Invalid(
                "column list must not be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&artifact.threshold) {
            return Err(ModelLoadError::Invalid(format!(
                "threshold {} is outside [0, 1]",
                artifact.threshold
            )));
        }

        let unknown = artifact
            .weights
            .keys()
            .chain(artifact.categorical.keys())
            .find(|column| !artifact.columns.contains(column));
        if let Some(column) = unknown {
            return Err(ModelLoadError::Invalid(format!(
                "weight given for '{column}', which is not in the column list"
            )));
        }

        Ok(Self { artifact })
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ModelLoadError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let oracle = Self::from_reader(file)?;
        info!(
            path = %path.display(),
            columns = oracle.artifact.columns.len(),
            "loaded linear model artifact"
        );
        Ok(oracle)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ModelLoadError> {
        let artifact: LinearModelArtifact = serde_json::from_reader(reader)?;
        Self::from_artifact(artifact)
    }

    pub fn artifact(&self) -> &LinearModelArtifact {
        &self.artifact
    }

    fn probability(&self, row: &[FeatureValue]) -> Result<f64, ScoringError> {
        let mut logit = self.artifact.intercept;
        for (column, value) in self.artifact.columns.iter().zip(row) {
            logit += self.contribution(column, value)?;
        }
        Ok(1.0 / (1.0 + (-logit).exp()))
    }

    fn contribution(&self, column: &str, value: &FeatureValue) -> Result<f64, ScoringError> {
        if let Some(levels) = self.artifact.categorical.get(column) {
            let level = match value {
                FeatureValue::Category(category) => category.clone(),
                FeatureValue::Numeric(number) => format_number(*number),
            };
            return Ok(levels.get(&level).copied().unwrap_or(0.0));
        }

        match (self.artifact.weights.get(column), value) {
            (Some(weight), FeatureValue::Numeric(number)) => Ok(weight * number),
            (Some(_), FeatureValue::Category(category)) => Err(ScoringError::UnsupportedValue {
                column: column.to_string(),
                message: format!("expected a number, got category '{category}'"),
            }),
            (None, _) => Ok(0.0),
        }
    }

    fn probabilities(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError> {
        check_shape(self.artifact.columns.len(), matrix)?;
        matrix
            .rows()
            .iter()
            .map(|row| self.probability(row))
            .collect()
    }
}

impl ScoringOracle for LinearOracle {
    fn columns(&self) -> &[String] {
        &self.artifact.columns
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionLabel>, ScoringError> {
        Ok(self
            .probabilities(matrix)?
            .into_iter()
            .map(|probability| {
                if probability >= self.artifact.threshold {
                    PredictionLabel::Approved
                } else {
                    PredictionLabel::NotApproved
                }
            })
            .collect())
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError> {
        self.probabilities(matrix)
    }
}
