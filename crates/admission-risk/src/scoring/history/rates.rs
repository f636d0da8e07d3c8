use super::dataset::HistoricalDataset;
use crate::scoring::domain::columns;
use crate::scoring::error::DataFormatError;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Historical approval rate per institution, in [0, 1].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HistoricalRateIndex {
    rates: BTreeMap<String, f64>,
}

impl HistoricalRateIndex {
    /// Group by institution and average the positive outcome. Records without an
    /// institution name are skipped; every other record counts toward its institution.
    pub fn build(dataset: &HistoricalDataset) -> Result<Self, DataFormatError> {
        let outcome = dataset.outcome();
        if !dataset.has_column(&outcome.column) {
            return Err(DataFormatError::MissingColumn {
                origin: dataset.origin().to_string(),
                column: outcome.column.clone(),
            });
        }

        let mut tallies: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        let mut conforming = 0usize;
        for record in dataset.records() {
            let Some(institution) = record.text(columns::INSTITUTION) else {
                continue;
            };

            let value = record.text(&outcome.column);
            let approved = value.as_deref() == Some(outcome.positive.as_str());
            if approved || value.as_deref() == Some(outcome.negative.as_str()) {
                conforming += 1;
            }

            let tally = tallies.entry(institution).or_insert((0, 0));
            tally.0 += usize::from(approved);
            tally.1 += 1;
        }

        if conforming == 0 {
            return Err(DataFormatError::NonConformingOutcome {
                origin: dataset.origin().to_string(),
                column: outcome.column.clone(),
                positive: outcome.positive.clone(),
                negative: outcome.negative.clone(),
            });
        }

        let rates = tallies
            .into_iter()
            .map(|(institution, (approved, total))| (institution, approved as f64 / total as f64))
            .collect::<BTreeMap<_, _>>();

        info!(institutions = rates.len(), conforming, "built historical rate index");
        Ok(Self { rates })
    }

    /// Every known institution at rate 0.0.
    pub fn degenerate(dataset: &HistoricalDataset) -> Self {
        Self {
            rates: dataset
                .institutions()
                .into_iter()
                .map(|institution| (institution, 0.0))
                .collect(),
        }
    }

    /// A build failure is a data-quality issue, not a fatal one: derivation proceeds on
    /// degenerate rates. The error is returned for reporting.
    pub fn build_or_degenerate(dataset: &HistoricalDataset) -> (Self, Option<DataFormatError>) {
        match Self::build(dataset) {
            Ok(index) => (index, None),
            Err(err) => {
                warn!(error = %err, "historical rates unavailable; using 0.0 for every institution");
                (Self::degenerate(dataset), Some(err))
            }
        }
    }

    pub fn from_rates<I, K>(rates: I) -> Self
    where
        I: IntoIterator<Item = (K, f64)>,
        K: Into<String>,
    {
        Self {
            rates: rates
                .into_iter()
                .map(|(institution, rate)| (institution.into(), rate))
                .collect(),
        }
    }

    /// Rate for an institution, 0.0 when unknown.
    pub fn rate(&self, institution: &str) -> f64 {
        self.get(institution).unwrap_or(0.0)
    }

    pub fn get(&self, institution: &str) -> Option<f64> {
        self.rates.get(institution.trim()).copied()
    }

    pub fn rates(&self) -> impl Iterator<Item = (&str, f64)> {
        self.rates
            .iter()
            .map(|(institution, rate)| (institution.as_str(), *rate))
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn mean_rate(&self) -> Option<f64> {
        if self.rates.is_empty() {
            return None;
        }
        Some(self.rates.values().sum::<f64>() / self.rates.len() as f64)
    }

    /// Share of institutions whose rate is at most `rate`, as 0-100. 0 with no institutions.
    pub fn percentile_of(&self, rate: f64) -> f64 {
        if self.rates.is_empty() {
            return 0.0;
        }
        let at_or_below = self.rates.values().filter(|value| **value <= rate).count();
        at_or_below as f64 / self.rates.len() as f64 * 100.0
    }
}
