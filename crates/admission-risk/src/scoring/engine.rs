use super::batch::{BatchScoringJob, BatchSlot, JobHandle, JobState};
use super::domain::{ApplicantRecord, PredictionResult};
use super::error::{ConcurrencyError, DataFormatError, EngineError};
use super::features::{DerivationSettings, DerivedApplicant, FeatureDeriver};
use super::history::{DatasetSummary, HistoricalDataset, HistoricalRateIndex, OutcomeLabels};
use super::oracle::{LinearOracle, ScoringOracle};
use super::profile::{ProfileComparator, ProfileComparison};
use super::schema::FeatureSchema;
use super::scorer::SingleApplicantScorer;
use crate::config::ScoringConfig;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Scored applicant with the values that fed the model and the cohort comparison.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApplicantProfile {
    pub prediction: PredictionResult,
    pub derived: DerivedApplicant,
    pub comparison: ProfileComparison,
}

/// Process-lifetime context: history and rates are built once, before any scoring, and
/// only read afterwards. The batch slot is the only mutable state.
pub struct ScoringEngine {
    dataset: Arc<HistoricalDataset>,
    index: Arc<HistoricalRateIndex>,
    index_issue: Option<DataFormatError>,
    oracle: Arc<dyn ScoringOracle>,
    deriver: Arc<FeatureDeriver>,
    comparator: ProfileComparator,
    batches: BatchSlot,
}

impl ScoringEngine {
    pub fn new(
        dataset: HistoricalDataset,
        oracle: Arc<dyn ScoringOracle>,
        settings: DerivationSettings,
    ) -> Result<Self, DataFormatError> {
        let (index, index_issue) = HistoricalRateIndex::build_or_degenerate(&dataset);
        let schema = FeatureSchema::resolve(oracle.columns())?;

        info!(
            records = dataset.len(),
            institutions = index.len(),
            model_columns = schema.width(),
            evaluation_year = settings.default_evaluation_year,
            "scoring engine ready"
        );

        Ok(Self {
            dataset: Arc::new(dataset),
            index: Arc::new(index),
            index_issue,
            oracle,
            deriver: Arc::new(FeatureDeriver::new(schema, settings)),
            comparator: ProfileComparator::default(),
            batches: BatchSlot::new(),
        })
    }

    /// Load the historical dataset and the linear model artifact named by the config.
    pub fn from_config(config: &ScoringConfig) -> Result<Self, EngineError> {
        let dataset = HistoricalDataset::from_path(&config.history_path, OutcomeLabels::default())?;
        let oracle = LinearOracle::from_path(&config.model_path)?;
        let engine = Self::new(dataset, Arc::new(oracle), config.derivation_settings())?;
        Ok(engine)
    }

    pub fn with_comparator(mut self, comparator: ProfileComparator) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn dataset(&self) -> &HistoricalDataset {
        &self.dataset
    }

    pub fn rate_index(&self) -> &HistoricalRateIndex {
        &self.index
    }

    /// Why the rate index is degenerate, if it is.
    pub fn rate_index_issue(&self) -> Option<&DataFormatError> {
        self.index_issue.as_ref()
    }

    pub fn deriver(&self) -> &FeatureDeriver {
        &self.deriver
    }

    pub fn oracle(&self) -> &dyn ScoringOracle {
        self.oracle.as_ref()
    }

    pub fn institution_rate(&self, institution: &str) -> f64 {
        self.index.rate(institution)
    }

    pub fn summary(&self) -> DatasetSummary {
        DatasetSummary::from_dataset(&self.dataset)
    }

    /// Score using the record's own evaluation year, or the configured default.
    pub fn score(&self, record: &ApplicantRecord) -> Result<PredictionResult, EngineError> {
        let year = self.deriver.evaluation_year_for(record);
        self.score_for_year(record, year)
    }

    pub fn score_for_year(
        &self,
        record: &ApplicantRecord,
        evaluation_year: i32,
    ) -> Result<PredictionResult, EngineError> {
        SingleApplicantScorer::new(&self.deriver).score(
            record,
            self.oracle.as_ref(),
            &self.index,
            evaluation_year,
        )
    }

    /// Score one applicant and compare them with the historical cohort.
    pub fn profile(&self, record: &ApplicantRecord) -> Result<ApplicantProfile, EngineError> {
        let year = self.deriver.evaluation_year_for(record);
        let (derived, prediction) = SingleApplicantScorer::new(&self.deriver).score_detailed(
            record,
            self.oracle.as_ref(),
            &self.index,
            year,
        )?;
        let comparison = self.compare(&derived, prediction.probability);

        Ok(ApplicantProfile {
            prediction,
            derived,
            comparison,
        })
    }

    pub fn compare(&self, applicant: &DerivedApplicant, probability: f64) -> ProfileComparison {
        self.comparator
            .compare(applicant, probability, &self.dataset, &self.index)
    }

    /// Start scoring an upload in the background. Refused while another job runs.
    pub fn submit_batch<P: AsRef<Path>>(&self, path: P) -> Result<JobHandle, ConcurrencyError> {
        let job = BatchScoringJob::new(
            path.as_ref(),
            Arc::clone(&self.oracle),
            Arc::clone(&self.deriver),
            Arc::clone(&self.index),
        );
        self.batches.submit(job)
    }

    pub fn batch_state(&self) -> Result<JobState, ConcurrencyError> {
        self.batches.state()
    }
}
