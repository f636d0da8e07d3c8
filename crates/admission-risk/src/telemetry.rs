use crate::config::TelemetryConfig;
use thiserror::Error;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

const RUST_LOG: &str = "RUST_LOG";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("ADMISSION_LOG_LEVEL '{directive}' is not a valid tracing filter")]
    InvalidLogLevel {
        directive: String,
        #[source]
        source: ParseError,
    },
    #[error("could not install the scoring log subscriber: {0}")]
    Install(#[source] Box<dyn std::error::Error + Send + Sync>),
}

/// Install the global fmt subscriber on stderr so stdout stays machine-readable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let rust_log = std::env::var(RUST_LOG).ok();
    let filter = log_filter(rust_log.as_deref(), &config.log_level)?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Install)
}

/// A parseable `RUST_LOG` wins; otherwise the configured level applies.
fn log_filter(rust_log: Option<&str>, log_level: &str) -> Result<EnvFilter, TelemetryError> {
    if let Some(filter) = rust_log.and_then(|directive| EnvFilter::try_new(directive).ok()) {
        return Ok(filter);
    }

    EnvFilter::try_new(log_level).map_err(|source| TelemetryError::InvalidLogLevel {
        directive: log_level.to_string(),
        source,
    })
}
