use super::common::*;
use crate::scoring::domain::columns;
use crate::scoring::profile::{
    ProfileComparator, RiskStatus, RiskTier, ThreeTierRiskPolicy, TwoTierRiskPolicy,
};

#[test]
fn compares_applicant_against_historical_means() {
    let dataset = dataset();
    let index = rate_index();
    let derived = deriver()
        .derive_fields(&applicant(), &index, EVALUATION_YEAR)
        .expect("applicant derives");

    let comparison = ProfileComparator::default().compare(&derived, 0.45, &dataset, &index);

    assert_eq!(comparison.probability, 0.45);
    assert_eq!(comparison.risk_tier, RiskTier::Medium);
    assert_eq!(comparison.risk_status, RiskStatus::AtRisk);
    assert_eq!(comparison.institution_rate, 0.5);
    // DON BOSCO 0.0 and LA SALLE 0.5 are at or below; SAN AGUSTIN is above.
    assert!((comparison.percentile - 200.0 / 3.0).abs() < 1e-9);

    let years = comparison
        .comparison(columns::YEARS_AFTER_SECONDARY)
        .expect("years compared");
    assert_eq!(years.applicant_value, 2.0);
    assert_eq!(years.historical_mean, Some(17.0 / 8.0));
    assert_eq!(years.difference(), Some(2.0 - 17.0 / 8.0));
}

#[test]
fn institution_rate_mean_is_taken_over_institutions() {
    let dataset = dataset();
    let index = rate_index();
    let derived = deriver()
        .derive_fields(&applicant(), &index, EVALUATION_YEAR)
        .expect("applicant derives");

    let comparison = ProfileComparator::default().compare(&derived, 0.7, &dataset, &index);

    let rate = comparison
        .comparison(columns::INSTITUTION_RATE)
        .expect("rate compared");
    assert_eq!(rate.applicant_value, 0.5);
    assert_eq!(rate.historical_mean, Some(0.5));
    assert_eq!(comparison.risk_tier, RiskTier::Low);
    assert_eq!(comparison.risk_status, RiskStatus::OutOfRisk);
}

#[test]
fn features_absent_from_history_have_no_mean() {
    let dataset = dataset();
    let index = rate_index();
    let derived = deriver()
        .derive_fields(&applicant(), &index, EVALUATION_YEAR)
        .expect("applicant derives");
    let comparator = ProfileComparator::new(
        vec!["PUNTAJE_PSA".to_string(), columns::AGE.to_string()],
        ThreeTierRiskPolicy::default(),
        TwoTierRiskPolicy::default(),
    );

    let comparison = comparator.compare(&derived, 0.1, &dataset, &index);

    let score = comparison.comparison("PUNTAJE_PSA").expect("listed feature");
    assert_eq!(score.applicant_value, 0.0);
    assert_eq!(score.historical_mean, None);
    assert_eq!(score.difference(), None);
    assert_eq!(comparison.comparisons.len(), 2);
    assert_eq!(comparison.risk_tier, RiskTier::High);
}

#[test]
fn comparison_leaves_inputs_untouched() {
    let dataset = dataset();
    let index = rate_index();
    let derived = deriver()
        .derive_fields(&applicant(), &index, EVALUATION_YEAR)
        .expect("applicant derives");
    let before = (derived.clone(), index.clone(), dataset.len());

    let first = ProfileComparator::default().compare(&derived, 0.3, &dataset, &index);
    let second = ProfileComparator::default().compare(&derived, 0.3, &dataset, &index);

    assert_eq!(first, second);
    assert_eq!(before, (derived, index, dataset.len()));
}
