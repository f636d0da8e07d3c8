use super::common::*;
use crate::scoring::domain::{columns, ApplicantRecord, PredictionLabel};
use crate::scoring::error::{EngineError, InvalidFieldError, ScoringError};
use crate::scoring::features::FeatureValue;
use crate::scoring::scorer::SingleApplicantScorer;

#[test]
fn returns_the_oracle_verdict() {
    let deriver = deriver();
    let oracle = FixedOracle::new(0.72);

    let result = SingleApplicantScorer::new(&deriver)
        .score(&applicant(), &oracle, &rate_index(), EVALUATION_YEAR)
        .expect("applicant scores");

    assert_eq!(result.label, PredictionLabel::Approved);
    assert_eq!(result.probability, 0.72);
    assert_eq!(oracle.calls(), 1);
}

#[test]
fn oracle_sees_one_row_in_model_order() {
    let deriver = deriver();
    let oracle = FixedOracle::new(0.3);

    SingleApplicantScorer::new(&deriver)
        .score(&applicant(), &oracle, &rate_index(), EVALUATION_YEAR)
        .expect("applicant scores");

    let matrix = oracle.last_matrix().expect("oracle was called");
    assert_eq!(matrix.len(), 1);
    assert_eq!(matrix.columns(), model_columns().as_slice());

    let rate_position = model_columns()
        .iter()
        .position(|column| column == columns::INSTITUTION_RATE)
        .expect("rate column present");
    assert_eq!(matrix.rows()[0][rate_position], FeatureValue::Numeric(0.5));
}

#[test]
fn missing_institution_never_reaches_the_oracle() {
    let deriver = deriver();
    let oracle = FixedOracle::new(0.9);
    let record = ApplicantRecord::new().with_text(columns::SEX, "F");

    let err = SingleApplicantScorer::new(&deriver)
        .score(&record, &oracle, &rate_index(), EVALUATION_YEAR)
        .expect_err("institution is required");

    assert!(matches!(
        err,
        EngineError::InvalidField(InvalidFieldError::Missing { .. })
    ));
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn short_oracle_output_is_a_scoring_error() {
    let deriver = deriver();

    let err = SingleApplicantScorer::new(&deriver)
        .score(&applicant(), &ShortOracle, &rate_index(), EVALUATION_YEAR)
        .expect_err("oracle dropped a row");

    assert!(matches!(
        err,
        EngineError::Scoring(ScoringError::RowCountMismatch {
            rows: 1,
            labels: 1,
            probabilities: 0
        })
    ));
}

#[test]
fn out_of_range_probability_is_rejected() {
    let deriver = deriver();
    let oracle = FixedOracle::new(1.4);

    let err = SingleApplicantScorer::new(&deriver)
        .score(&applicant(), &oracle, &rate_index(), EVALUATION_YEAR)
        .expect_err("probability above one");

    assert!(matches!(
        err,
        EngineError::Scoring(ScoringError::ProbabilityOutOfRange { row: 1, .. })
    ));
}
