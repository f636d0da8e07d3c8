use crate::scoring::domain::{columns, ApplicantRecord};
use crate::scoring::error::DataFormatError;
use crate::scoring::ingest::{self, Table};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;
use tracing::info;

const ORIGIN: &str = "historical dataset";

/// Outcome column and the two values a conforming record may carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeLabels {
    pub column: String,
    pub positive: String,
    pub negative: String,
}

impl Default for OutcomeLabels {
    fn default() -> Self {
        Self {
            column: columns::OUTCOME.to_string(),
            positive: "APR".to_string(),
            negative: "REP".to_string(),
        }
    }
}

/// Past applicants with known outcomes. Loaded once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct HistoricalDataset {
    headers: Vec<String>,
    records: Vec<ApplicantRecord>,
    outcome: OutcomeLabels,
}

impl HistoricalDataset {
    pub fn from_path<P: AsRef<Path>>(
        path: P,
        outcome: OutcomeLabels,
    ) -> Result<Self, DataFormatError> {
        let path = path.as_ref();
        let table = ingest::read_table_from_path(path, ORIGIN)?;
        let dataset = Self::from_table(table, outcome);
        info!(
            path = %path.display(),
            records = dataset.len(),
            columns = dataset.headers.len(),
            "loaded historical dataset"
        );
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R, outcome: OutcomeLabels) -> Result<Self, DataFormatError> {
        let table = ingest::read_table(reader, ORIGIN)?;
        Ok(Self::from_table(table, outcome))
    }

    pub fn from_records(
        headers: Vec<String>,
        records: Vec<ApplicantRecord>,
        outcome: OutcomeLabels,
    ) -> Self {
        Self {
            headers,
            records,
            outcome,
        }
    }

    fn from_table(table: Table, outcome: OutcomeLabels) -> Self {
        let records = table.records();
        Self {
            headers: table.headers,
            records,
            outcome,
        }
    }

    pub fn origin(&self) -> &'static str {
        ORIGIN
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn records(&self) -> &[ApplicantRecord] {
        &self.records
    }

    pub fn outcome(&self) -> &OutcomeLabels {
        &self.outcome
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }

    /// Mean of the column's numeric values; `None` when the column is absent or has none.
    pub fn column_mean(&self, column: &str) -> Option<f64> {
        if !self.has_column(column) {
            return None;
        }

        let (sum, count) = self
            .records
            .iter()
            .filter_map(|record| record.number(column))
            .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));

        (count > 0).then(|| sum / count as f64)
    }

    /// Distinct institution names, sorted.
    pub fn institutions(&self) -> BTreeSet<String> {
        self.records
            .iter()
            .filter_map(|record| record.text(columns::INSTITUTION))
            .collect()
    }
}
