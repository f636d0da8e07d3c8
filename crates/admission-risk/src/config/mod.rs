use crate::scoring::{AgeConvention, DerivationSettings};
use chrono::{Datelike, Local};
use std::env;
use std::fmt;
use std::path::PathBuf;

/// Top-level configuration for the scoring engine and its front ends.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub scoring: ScoringConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let history_path = env::var("ADMISSION_HISTORY_PATH")
            .unwrap_or_else(|_| "data/dataset_eda.csv".to_string());
        let model_path =
            env::var("ADMISSION_MODEL_PATH").unwrap_or_else(|_| "model/model.json".to_string());

        let evaluation_year = match env::var("ADMISSION_EVALUATION_YEAR") {
            Ok(raw) => raw
                .trim()
                .parse::<i32>()
                .map_err(|_| ConfigError::InvalidEvaluationYear(raw))?,
            Err(_) => Local::now().year(),
        };

        let age_convention = match env::var("ADMISSION_AGE_CONVENTION") {
            Ok(raw) => raw
                .parse::<AgeConvention>()
                .map_err(ConfigError::InvalidAgeConvention)?,
            Err(_) => AgeConvention::default(),
        };

        let defaults = DerivationSettings::new(evaluation_year);
        let reference_city =
            env::var("ADMISSION_REFERENCE_CITY").unwrap_or(defaults.reference_city);
        let reference_province =
            env::var("ADMISSION_REFERENCE_PROVINCE").unwrap_or(defaults.reference_province);

        let log_level = env::var("ADMISSION_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            scoring: ScoringConfig {
                history_path: PathBuf::from(history_path),
                model_path: PathBuf::from(model_path),
                evaluation_year,
                age_convention,
                reference_city,
                reference_province,
            },
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Input artifacts and derivation constants.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub history_path: PathBuf,
    pub model_path: PathBuf,
    pub evaluation_year: i32,
    pub age_convention: AgeConvention,
    pub reference_city: String,
    pub reference_province: String,
}

impl ScoringConfig {
    pub fn derivation_settings(&self) -> DerivationSettings {
        DerivationSettings {
            reference_city: self.reference_city.clone(),
            reference_province: self.reference_province.clone(),
            age_convention: self.age_convention,
            default_evaluation_year: self.evaluation_year,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidEvaluationYear(String),
    InvalidAgeConvention(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidEvaluationYear(value) => write!(
                f,
                "ADMISSION_EVALUATION_YEAR must be a year, got '{}'",
                value
            ),
            ConfigError::InvalidAgeConvention(message) => {
                write!(f, "ADMISSION_AGE_CONVENTION is invalid: {}", message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("ADMISSION_HISTORY_PATH");
        env::remove_var("ADMISSION_MODEL_PATH");
        env::remove_var("ADMISSION_EVALUATION_YEAR");
        env::remove_var("ADMISSION_AGE_CONVENTION");
        env::remove_var("ADMISSION_REFERENCE_CITY");
        env::remove_var("ADMISSION_REFERENCE_PROVINCE");
        env::remove_var("ADMISSION_LOG_LEVEL");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(
            config.scoring.history_path,
            PathBuf::from("data/dataset_eda.csv")
        );
        assert_eq!(config.scoring.model_path, PathBuf::from("model/model.json"));
        assert_eq!(config.scoring.evaluation_year, Local::now().year());
        assert_eq!(config.scoring.age_convention, AgeConvention::default());
        assert_eq!(config.scoring.reference_city, "COCHABAMBA");
        assert_eq!(config.scoring.reference_province, "COCHABAMBA (CERCADO)");
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn overrides_flow_into_derivation_settings() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMISSION_EVALUATION_YEAR", "2024");
        env::set_var("ADMISSION_AGE_CONVENTION", "calendar-year");
        env::set_var("ADMISSION_REFERENCE_CITY", "LA PAZ");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        let settings = config.scoring.derivation_settings();
        assert_eq!(settings.default_evaluation_year, 2024);
        assert_eq!(settings.age_convention, AgeConvention::CalendarYear);
        assert_eq!(settings.reference_city, "LA PAZ");
        assert_eq!(settings.reference_province, "COCHABAMBA (CERCADO)");
    }

    #[test]
    fn rejects_non_numeric_year() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("ADMISSION_EVALUATION_YEAR", "next year");
        let error = AppConfig::load().expect_err("invalid year");
        reset_env();
        assert!(matches!(error, ConfigError::InvalidEvaluationYear(_)));
    }
}
