use crate::config::ConfigError;
use crate::scoring::{BatchFailure, ConcurrencyError, EngineError};
use crate::telemetry::TelemetryError;
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Csv(csv::Error),
    Json(serde_json::Error),
    Engine(EngineError),
    Batch(BatchFailure),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "logging setup failed: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Csv(err) => write!(f, "csv error: {}", err),
            AppError::Json(err) => write!(f, "json error: {}", err),
            AppError::Engine(err) => write!(f, "scoring error: {}", err),
            AppError::Batch(err) => write!(f, "batch error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Csv(err) => Some(err),
            AppError::Json(err) => Some(err),
            AppError::Engine(err) => Some(err),
            AppError::Batch(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for AppError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<EngineError> for AppError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

impl From<ConcurrencyError> for AppError {
    fn from(value: ConcurrencyError) -> Self {
        Self::Engine(value.into())
    }
}

impl From<BatchFailure> for AppError {
    fn from(value: BatchFailure) -> Self {
        Self::Batch(value)
    }
}
