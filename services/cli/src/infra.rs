use crate::cli::EngineArgs;
use admission_risk::config::AppConfig;
use admission_risk::error::AppError;
use admission_risk::scoring::{ApplicantRecord, ScoringEngine};
use admission_risk::telemetry;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::info;

const OUTPUT_SUFFIX: &str = "_evaluado";

/// Load configuration, apply command-line overrides, start tracing, build the engine.
pub(crate) fn bootstrap(overrides: &EngineArgs) -> Result<ScoringEngine, AppError> {
    let mut config = AppConfig::load()?;

    if let Some(history) = overrides.history.clone() {
        config.scoring.history_path = history;
    }
    if let Some(model) = overrides.model.clone() {
        config.scoring.model_path = model;
    }
    if let Some(year) = overrides.year {
        config.scoring.evaluation_year = year;
    }

    telemetry::init(&config.telemetry)?;

    info!(
        history = %config.scoring.history_path.display(),
        model = %config.scoring.model_path.display(),
        evaluation_year = config.scoring.evaluation_year,
        "loading scoring engine"
    );

    Ok(ScoringEngine::from_config(&config.scoring)?)
}

pub(crate) fn read_record(path: &Path) -> Result<ApplicantRecord, AppError> {
    let file = File::open(path)?;
    let record = serde_json::from_reader(BufReader::new(file))?;
    Ok(record)
}

/// `solicitantes.csv` -> `solicitantes_evaluado.csv`, next to the input.
pub(crate) fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "resultados".to_string());
    input.with_file_name(format!("{stem}{OUTPUT_SUFFIX}.csv"))
}

pub(crate) fn parse_year(raw: &str) -> Result<i32, String> {
    raw.trim()
        .parse::<i32>()
        .map_err(|err| format!("failed to parse '{raw}' as a year ({err})"))
}
