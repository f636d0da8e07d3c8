//! Comparison of a scored applicant against the historical cohort.

mod policy;

pub use policy::{RiskStatus, RiskTier, ThreeTierRiskPolicy, TwoTierRiskPolicy};

use super::domain::columns;
use super::features::DerivedApplicant;
use super::history::{HistoricalDataset, HistoricalRateIndex};
use serde::Serialize;

/// Numeric columns compared against their historical mean by default.
pub const DEFAULT_COMPARISON_FEATURES: [&str; 8] = [
    columns::PERIOD,
    columns::ADMISSION_OPTION,
    columns::AGE,
    columns::BACHELOR_YEAR,
    columns::YEARS_AFTER_SECONDARY,
    columns::IS_ADULT,
    columns::MIGRATED,
    columns::INSTITUTION_RATE,
];

/// Applicant value next to the historical mean of the same column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureComparison {
    pub column: String,
    pub applicant_value: f64,
    /// `None` when the historical dataset has no numeric values for the column.
    pub historical_mean: Option<f64>,
}

impl FeatureComparison {
    pub fn difference(&self) -> Option<f64> {
        self.historical_mean.map(|mean| self.applicant_value - mean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileComparison {
    pub probability: f64,
    pub risk_tier: RiskTier,
    pub risk_status: RiskStatus,
    pub institution_rate: f64,
    /// Share of institutions with a rate at or below this applicant's, 0-100.
    pub percentile: f64,
    pub comparisons: Vec<FeatureComparison>,
}

impl ProfileComparison {
    pub fn comparison(&self, column: &str) -> Option<&FeatureComparison> {
        self.comparisons
            .iter()
            .find(|comparison| comparison.column == column)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfileComparator {
    features: Vec<String>,
    three_tier: ThreeTierRiskPolicy,
    two_tier: TwoTierRiskPolicy,
}

impl Default for ProfileComparator {
    fn default() -> Self {
        Self {
            features: DEFAULT_COMPARISON_FEATURES
                .iter()
                .map(|column| column.to_string())
                .collect(),
            three_tier: ThreeTierRiskPolicy::default(),
            two_tier: TwoTierRiskPolicy::default(),
        }
    }
}

impl ProfileComparator {
    pub fn new(
        features: Vec<String>,
        three_tier: ThreeTierRiskPolicy,
        two_tier: TwoTierRiskPolicy,
    ) -> Self {
        Self {
            features,
            three_tier,
            two_tier,
        }
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn three_tier(&self) -> &ThreeTierRiskPolicy {
        &self.three_tier
    }

    pub fn two_tier(&self) -> &TwoTierRiskPolicy {
        &self.two_tier
    }

    /// Pure function of its inputs; neither the applicant nor the history is modified.
    pub fn compare(
        &self,
        applicant: &DerivedApplicant,
        probability: f64,
        dataset: &HistoricalDataset,
        index: &HistoricalRateIndex,
    ) -> ProfileComparison {
        let institution_rate = applicant.institution_rate();

        let comparisons = self
            .features
            .iter()
            .map(|column| FeatureComparison {
                column: column.clone(),
                applicant_value: applicant.numeric(column).unwrap_or(0.0),
                historical_mean: historical_mean(column, dataset, index),
            })
            .collect();

        ProfileComparison {
            probability,
            risk_tier: self.three_tier.classify(probability),
            risk_status: self.two_tier.classify(probability),
            institution_rate,
            percentile: index.percentile_of(institution_rate),
            comparisons,
        }
    }
}

/// The institution rate is averaged over institutions, not applicants.
fn historical_mean(
    column: &str,
    dataset: &HistoricalDataset,
    index: &HistoricalRateIndex,
) -> Option<f64> {
    if column == columns::INSTITUTION_RATE {
        index.mean_rate()
    } else {
        dataset.column_mean(column)
    }
}
