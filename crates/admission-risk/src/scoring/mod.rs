//! Admission risk scoring: feature derivation, historical rates, single and batch
//! scoring against an opaque oracle, and cohort comparison.

pub mod batch;
pub mod domain;
mod engine;
pub mod error;
pub mod features;
pub mod history;
mod ingest;
pub mod oracle;
pub mod profile;
pub mod schema;
mod scorer;

#[cfg(test)]
mod tests;

pub use batch::{BatchFailure, BatchScoringJob, JobHandle, JobId, JobOutcome, JobState, ResultTable};
pub use domain::{
    columns, ApplicantRecord, PredictionLabel, PredictionResult, RawValue,
    REQUIRED_UPLOAD_COLUMNS,
};
pub use engine::{ApplicantProfile, ScoringEngine};
pub use error::{
    ConcurrencyError, DataFormatError, EngineError, InvalidFieldError, ModelLoadError,
    ScoringError,
};
pub use features::{
    AgeConvention, DerivationSettings, DerivedApplicant, FeatureDeriver, FeatureValue,
    FeatureVector,
};
pub use history::{DatasetSummary, HistoricalDataset, HistoricalRateIndex, OutcomeLabels};
pub use oracle::{FeatureMatrix, LinearModelArtifact, LinearOracle, ScoringOracle};
pub use profile::{
    FeatureComparison, ProfileComparator, ProfileComparison, RiskStatus, RiskTier,
    ThreeTierRiskPolicy, TwoTierRiskPolicy,
};
pub use schema::{FeatureColumn, FeatureKind, FeatureSchema};
pub use scorer::SingleApplicantScorer;
