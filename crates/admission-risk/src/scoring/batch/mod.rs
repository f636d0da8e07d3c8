//! Background scoring of whole uploads, one job at a time.
//!
//! A job runs on its own worker thread and moves the shared slot through
//! `Idle -> Running -> {Completed | Failed}`. Submissions are refused while a job is
//! running; they are never queued.

mod table;

pub use table::{ResultTable, ScoredRow};

use super::domain::REQUIRED_UPLOAD_COLUMNS;
use super::error::{ConcurrencyError, EngineError};
use super::features::FeatureDeriver;
use super::history::HistoricalRateIndex;
use super::ingest;
use super::oracle::{score_matrix, FeatureMatrix, ScoringOracle};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use tokio::sync::oneshot;
use tracing::{info, warn};

const UPLOAD_ORIGIN: &str = "upload";
const WORKER_LOST: &str = "batch worker stopped before reporting an outcome";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job-{:04}", self.0)
    }
}

/// Observable state of the batch slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum JobState {
    #[default]
    Idle,
    Running { job_id: JobId },
    Completed { job_id: JobId, rows: usize },
    Failed { job_id: JobId, message: String },
}

impl JobState {
    pub fn is_running(&self) -> bool {
        matches!(self, JobState::Running { .. })
    }
}

/// Aggregate failure of a whole batch. The message is the underlying error, verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{job_id} failed: {message}")]
pub struct BatchFailure {
    pub job_id: JobId,
    pub message: String,
}

pub type JobOutcome = Result<ResultTable, BatchFailure>;

/// Everything a job needs, shared read-only with the engine.
pub struct BatchScoringJob {
    path: PathBuf,
    oracle: Arc<dyn ScoringOracle>,
    deriver: Arc<FeatureDeriver>,
    index: Arc<HistoricalRateIndex>,
}

impl BatchScoringJob {
    pub fn new(
        path: impl Into<PathBuf>,
        oracle: Arc<dyn ScoringOracle>,
        deriver: Arc<FeatureDeriver>,
        index: Arc<HistoricalRateIndex>,
    ) -> Self {
        Self {
            path: path.into(),
            oracle,
            deriver,
            index,
        }
    }

    /// Read, derive, score once for the whole table, attach. Any error aborts everything.
    pub fn run(&self) -> Result<ResultTable, EngineError> {
        let table = ingest::read_table_from_path(&self.path, UPLOAD_ORIGIN)?;
        table.require_columns(&REQUIRED_UPLOAD_COLUMNS, UPLOAD_ORIGIN)?;

        let records = table.records();
        let vectors = self.deriver.derive_all(&records, &self.index)?;
        let matrix = FeatureMatrix::from_vectors(self.deriver.schema().column_names(), vectors);
        let predictions = score_matrix(self.oracle.as_ref(), &matrix)?;

        Ok(ResultTable::new(table.headers, table.rows, predictions))
    }
}

/// Awaitable handle to a submitted job.
#[derive(Debug)]
pub struct JobHandle {
    job_id: JobId,
    receiver: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    pub fn job_id(&self) -> JobId {
        self.job_id
    }

    pub async fn wait(self) -> JobOutcome {
        let job_id = self.job_id;
        self.receiver.await.unwrap_or_else(|_| Err(lost(job_id)))
    }

    /// Blocks the current thread. Must not be called from inside an async runtime.
    pub fn wait_blocking(self) -> JobOutcome {
        let job_id = self.job_id;
        self.receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(lost(job_id)))
    }
}

fn lost(job_id: JobId) -> BatchFailure {
    BatchFailure {
        job_id,
        message: WORKER_LOST.to_string(),
    }
}

/// The one place a batch job may run.
#[derive(Debug, Default)]
pub struct BatchSlot {
    state: Arc<Mutex<JobState>>,
    sequence: AtomicU64,
}

impl BatchSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> Result<JobState, ConcurrencyError> {
        self.state
            .lock()
            .map(|state| state.clone())
            .map_err(|_| ConcurrencyError::SlotPoisoned)
    }

    pub fn submit(&self, job: BatchScoringJob) -> Result<JobHandle, ConcurrencyError> {
        let job_id = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| ConcurrencyError::SlotPoisoned)?;
            if let JobState::Running { job_id } = *state {
                warn!(%job_id, "refused batch submission while a job is running");
                return Err(ConcurrencyError::JobRunning(job_id));
            }
            let job_id = JobId(self.sequence.fetch_add(1, Ordering::Relaxed) + 1);
            *state = JobState::Running { job_id };
            job_id
        };

        info!(%job_id, path = %job.path.display(), "batch job submitted");

        let (sender, receiver) = oneshot::channel();
        let state = Arc::clone(&self.state);
        let spawned = thread::Builder::new()
            .name(format!("batch-{job_id}"))
            .spawn(move || {
                let mut guard = SettleGuard {
                    state,
                    job_id,
                    settled: false,
                };
                let outcome = job.run().map_err(|err| BatchFailure {
                    job_id,
                    message: err.to_string(),
                });
                guard.settle(&outcome);
                let _ = sender.send(outcome);
            });

        if let Err(err) = spawned {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            *state = JobState::Failed {
                job_id,
                message: err.to_string(),
            };
            return Err(ConcurrencyError::WorkerUnavailable(err.to_string()));
        }

        Ok(JobHandle { job_id, receiver })
    }
}

/// Moves the slot to a terminal state before the outcome is delivered, and to `Failed`
/// if the worker unwinds without settling.
struct SettleGuard {
    state: Arc<Mutex<JobState>>,
    job_id: JobId,
    settled: bool,
}

impl SettleGuard {
    fn settle(&mut self, outcome: &JobOutcome) {
        let next = match outcome {
            Ok(table) => {
                info!(job_id = %self.job_id, rows = table.len(), approved = table.approved(), "batch job completed");
                JobState::Completed {
                    job_id: self.job_id,
                    rows: table.len(),
                }
            }
            Err(failure) => {
                warn!(job_id = %self.job_id, error = %failure.message, "batch job failed");
                JobState::Failed {
                    job_id: self.job_id,
                    message: failure.message.clone(),
                }
            }
        };
        self.store(next);
        self.settled = true;
    }

    fn store(&self, next: JobState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *state = next;
    }
}

impl Drop for SettleGuard {
    fn drop(&mut self) {
        if !self.settled {
            warn!(job_id = %self.job_id, "batch worker unwound without an outcome");
            self.store(JobState::Failed {
                job_id: self.job_id,
                message: WORKER_LOST.to_string(),
            });
        }
    }
}
