use super::batch::JobId;

/// Malformed or incomplete tabular input: the historical dataset, an upload, or the
/// model's column list.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DataFormatError {
    #[error("{origin} is missing required column '{column}'")]
    MissingColumn { origin: String, column: String },
    #[error("{origin} has no records whose '{column}' is '{positive}' or '{negative}'")]
    NonConformingOutcome {
        origin: String,
        column: String,
        positive: String,
        negative: String,
    },
    #[error("failed to read {origin}: {message}")]
    Unreadable { origin: String, message: String },
    #[error("{origin} row {row} is malformed: {message}")]
    MalformedRow {
        origin: String,
        row: usize,
        message: String,
    },
    #[error("model column list is empty")]
    EmptyColumnList,
    #[error("model column list names '{0}' more than once")]
    DuplicateColumn(String),
}

/// A record lacks an identity field that derivation cannot default.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidFieldError {
    #[error("applicant record is missing required field '{field}'")]
    Missing { field: &'static str },
    #[error("row {row} is missing required field '{field}'")]
    MissingInRow { row: usize, field: &'static str },
}

impl InvalidFieldError {
    /// Attach a 1-based row number for batch reporting.
    pub fn at_row(self, row: usize) -> Self {
        match self {
            InvalidFieldError::Missing { field } | InvalidFieldError::MissingInRow { field, .. } => {
                InvalidFieldError::MissingInRow { row, field }
            }
        }
    }
}

/// The oracle call failed or returned something the engine cannot attach to its input.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoringError {
    #[error("model expects {expected} columns but the input matrix declares {actual}")]
    ColumnCountMismatch { expected: usize, actual: usize },
    #[error("model expects {expected} columns but row {row} has {actual}")]
    ShapeMismatch {
        expected: usize,
        actual: usize,
        row: usize,
    },
    #[error(
        "model returned {labels} labels and {probabilities} probabilities for {rows} rows"
    )]
    RowCountMismatch {
        rows: usize,
        labels: usize,
        probabilities: usize,
    },
    #[error("model returned probability {value} for row {row}, outside [0, 1]")]
    ProbabilityOutOfRange { row: usize, value: f64 },
    #[error("model cannot score column '{column}': {message}")]
    UnsupportedValue { column: String, message: String },
    #[error("model failure: {0}")]
    Oracle(String),
}

/// The single batch slot refused or lost a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConcurrencyError {
    #[error("batch job {0} is still running; wait for it to finish before submitting another")]
    JobRunning(JobId),
    #[error("batch slot state is unavailable after a worker panic")]
    SlotPoisoned,
    #[error("could not start batch worker: {0}")]
    WorkerUnavailable(String),
}

/// Failure loading the model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("failed to read model artifact: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid model artifact: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid model artifact: {0}")]
    Invalid(String),
}

/// Umbrella error returned by engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),
    #[error(transparent)]
    InvalidField(#[from] InvalidFieldError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyError),
    #[error(transparent)]
    Model(#[from] ModelLoadError),
}
