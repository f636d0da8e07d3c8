use super::domain::{ApplicantRecord, PredictionResult};
use super::error::{EngineError, ScoringError};
use super::features::{DerivedApplicant, FeatureDeriver};
use super::history::HistoricalRateIndex;
use super::oracle::{score_matrix, FeatureMatrix, ScoringOracle};

/// Scores one applicant inline on the caller's thread.
pub struct SingleApplicantScorer<'a> {
    deriver: &'a FeatureDeriver,
}

impl<'a> SingleApplicantScorer<'a> {
    pub fn new(deriver: &'a FeatureDeriver) -> Self {
        Self { deriver }
    }

    pub fn score(
        &self,
        record: &ApplicantRecord,
        oracle: &dyn ScoringOracle,
        index: &HistoricalRateIndex,
        evaluation_year: i32,
    ) -> Result<PredictionResult, EngineError> {
        self.score_detailed(record, oracle, index, evaluation_year)
            .map(|(_, prediction)| prediction)
    }

    /// Like [`score`](Self::score), also returning the derived values for comparison.
    pub fn score_detailed(
        &self,
        record: &ApplicantRecord,
        oracle: &dyn ScoringOracle,
        index: &HistoricalRateIndex,
        evaluation_year: i32,
    ) -> Result<(DerivedApplicant, PredictionResult), EngineError> {
        let derived = self
            .deriver
            .derive_fields(record, index, evaluation_year)?;
        let vector = derived.reindex(self.deriver.schema());
        let matrix = FeatureMatrix::from_vectors(self.deriver.schema().column_names(), vec![vector]);

        let prediction = score_matrix(oracle, &matrix)?
            .pop()
            .ok_or(ScoringError::RowCountMismatch {
                rows: 1,
                labels: 0,
                probabilities: 0,
            })?;

        Ok((derived, prediction))
    }
}
