use std::io::{Cursor, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tempfile::NamedTempFile;

use crate::scoring::domain::{columns, ApplicantRecord, PredictionLabel};
use crate::scoring::error::ScoringError;
use crate::scoring::features::{DerivationSettings, FeatureDeriver};
use crate::scoring::history::{HistoricalDataset, HistoricalRateIndex, OutcomeLabels};
use crate::scoring::oracle::{FeatureMatrix, ScoringOracle};
use crate::scoring::schema::FeatureSchema;
use crate::scoring::ScoringEngine;

pub(super) const EVALUATION_YEAR: i32 = 2024;

/// LA SALLE 2/4 approved, SAN AGUSTIN 1/1, DON BOSCO 0/2, plus one unnamed row.
pub(super) const HISTORY_CSV: &str = "\
NOMBRE_COLEGIO,CIUDAD_COLEGIO,PROVINCIA_COLEGIO,PERIODO,OPC_INGRESO,ANIO_BACHILLERATO,EDAD,ANIOS_POST_BACH,MAYOR_EDAD,MIGRA_UNIVERSIDAD,RESULTADO_FINAL
LA SALLE,COCHABAMBA,COCHABAMBA (CERCADO),1,1,2022,18,1,1,0,APR
LA SALLE,COCHABAMBA,COCHABAMBA (CERCADO),1,2,2021,19,2,1,0,REP
LA SALLE,COCHABAMBA,COCHABAMBA (CERCADO),2,1,2020,20,3,1,0,APR
LA SALLE,COCHABAMBA,COCHABAMBA (CERCADO),2,2,2023,17,0,0,0,REP
SAN AGUSTIN,LA PAZ,MURILLO,1,1,2022,18,1,1,1,APR
DON BOSCO,SUCRE,OROPEZA,1,1,2019,22,4,1,1,REP
DON BOSCO,SUCRE,OROPEZA,2,2,2018,24,5,1,1,REP
,COCHABAMBA,COCHABAMBA (CERCADO),1,1,2022,18,1,1,0,APR
";

pub(super) fn model_columns() -> Vec<String> {
    [
        columns::PERIOD,
        columns::SEX,
        columns::ADMISSION_OPTION,
        columns::INSTITUTION_CITY,
        columns::INSTITUTION_PROVINCE,
        columns::BACHELOR_YEAR,
        columns::NATIONALITY,
        columns::MARITAL_STATUS,
        columns::AGE,
        columns::YEARS_AFTER_SECONDARY,
        columns::SCHOOL_TYPE_COMPOSITE,
        columns::IS_ADULT,
        columns::MIGRATED,
        columns::INSTITUTION_RATE,
    ]
    .iter()
    .map(|column| column.to_string())
    .collect()
}

pub(super) fn dataset() -> HistoricalDataset {
    HistoricalDataset::from_reader(Cursor::new(HISTORY_CSV), OutcomeLabels::default())
        .expect("history parses")
}

pub(super) fn rate_index() -> HistoricalRateIndex {
    HistoricalRateIndex::build(&dataset()).expect("rates build")
}

pub(super) fn settings() -> DerivationSettings {
    DerivationSettings::new(EVALUATION_YEAR)
}

pub(super) fn deriver() -> FeatureDeriver {
    let schema = FeatureSchema::resolve(&model_columns()).expect("schema resolves");
    FeatureDeriver::new(schema, settings())
}

pub(super) fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

pub(super) fn applicant() -> ApplicantRecord {
    ApplicantRecord::new()
        .with_text(columns::INSTITUTION, "LA SALLE")
        .with_text(columns::INSTITUTION_CITY, "COCHABAMBA")
        .with_text(columns::INSTITUTION_PROVINCE, "COCHABAMBA (CERCADO)")
        .with_date(columns::BIRTH_DATE, date(2005, 3, 15))
        .with_number(columns::EVALUATION_YEAR, f64::from(EVALUATION_YEAR))
        .with_number(columns::BACHELOR_YEAR, 2022.0)
        .with_text(columns::MARITAL_STATUS, "SOLTERO")
        .with_text(columns::NATIONALITY, "BOLIVIANA")
        .with_text(columns::WORKED, "NO")
        .with_text(columns::SCHOOL_TYPE, "PRIVADO")
        .with_number(columns::ADMISSION_OPTION, 1.0)
        .with_number(columns::PERIOD, 2.0)
        .with_text(columns::SEX, "F")
}

pub(super) fn engine_with(oracle: Arc<dyn ScoringOracle>) -> ScoringEngine {
    ScoringEngine::new(dataset(), oracle, settings()).expect("engine builds")
}

/// Returns the same probability for every row and remembers what it was asked to score.
pub(super) struct FixedOracle {
    columns: Vec<String>,
    probability: f64,
    seen: Mutex<Vec<FeatureMatrix>>,
}

impl FixedOracle {
    pub(super) fn new(probability: f64) -> Self {
        Self::with_columns(model_columns(), probability)
    }

    pub(super) fn with_columns(columns: Vec<String>, probability: f64) -> Self {
        Self {
            columns,
            probability,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.seen.lock().expect("oracle mutex poisoned").len()
    }

    pub(super) fn last_matrix(&self) -> Option<FeatureMatrix> {
        self.seen
            .lock()
            .expect("oracle mutex poisoned")
            .last()
            .cloned()
    }
}

impl ScoringOracle for FixedOracle {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionLabel>, ScoringError> {
        self.seen
            .lock()
            .expect("oracle mutex poisoned")
            .push(matrix.clone());
        let label = if self.probability >= 0.5 {
            PredictionLabel::Approved
        } else {
            PredictionLabel::NotApproved
        };
        Ok(vec![label; matrix.len()])
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError> {
        Ok(vec![self.probability; matrix.len()])
    }
}

/// Probability grows with row position, so output order can be checked.
pub(super) struct PositionalOracle;

impl PositionalOracle {
    pub(super) fn probability_for(row: usize) -> f64 {
        (row as f64 + 1.0) / 1000.0
    }
}

impl ScoringOracle for PositionalOracle {
    fn columns(&self) -> &[String] {
        static COLUMNS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        COLUMNS.get_or_init(model_columns)
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionLabel>, ScoringError> {
        Ok(vec![PredictionLabel::NotApproved; matrix.len()])
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError> {
        Ok((0..matrix.len()).map(Self::probability_for).collect())
    }
}

/// Drops the last probability, as a broken model might.
pub(super) struct ShortOracle;

impl ScoringOracle for ShortOracle {
    fn columns(&self) -> &[String] {
        static COLUMNS: std::sync::OnceLock<Vec<String>> = std::sync::OnceLock::new();
        COLUMNS.get_or_init(model_columns)
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionLabel>, ScoringError> {
        Ok(vec![PredictionLabel::Approved; matrix.len()])
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError> {
        Ok(vec![0.9; matrix.len().saturating_sub(1)])
    }
}

/// Blocks inside `predict` until the test opens the gate.
pub(super) struct GatedOracle {
    inner: FixedOracle,
    gate: Mutex<Receiver<()>>,
}

impl GatedOracle {
    pub(super) fn new(probability: f64) -> (Self, Sender<()>) {
        let (sender, receiver) = mpsc::channel();
        (
            Self {
                inner: FixedOracle::new(probability),
                gate: Mutex::new(receiver),
            },
            sender,
        )
    }
}

impl ScoringOracle for GatedOracle {
    fn columns(&self) -> &[String] {
        self.inner.columns()
    }

    fn predict(&self, matrix: &FeatureMatrix) -> Result<Vec<PredictionLabel>, ScoringError> {
        self.gate
            .lock()
            .expect("gate mutex poisoned")
            .recv()
            .map_err(|_| ScoringError::Oracle("gate closed".to_string()))?;
        self.inner.predict(matrix)
    }

    fn predict_proba(&self, matrix: &FeatureMatrix) -> Result<Vec<f64>, ScoringError> {
        self.inner.predict_proba(matrix)
    }
}

pub(super) const UPLOAD_HEADER: &str = "FECHA_NAC,ANIO,ANIO_BACHILLERATO,NOMBRE_COLEGIO,CIUDAD_COLEGIO,PROVINCIA_COLEGIO,ESTADO_CIVIL,NACIONALIDAD,TRABAJA,TIPO_COLEGIO,SEXO,EXTRA";

/// `rows` synthetic applicants with every required column populated.
pub(super) fn upload_csv(rows: usize) -> String {
    let schools = ["LA SALLE", "SAN AGUSTIN", "DON BOSCO", "NUEVO COLEGIO"];
    let mut csv = format!("{UPLOAD_HEADER}\n");
    for row in 0..rows {
        csv.push_str(&format!(
            "{}-0{}-1{},2024,{},{},COCHABAMBA,COCHABAMBA (CERCADO),SOLTERO,BOLIVIANA,{},FISCAL,{},note-{}\n",
            2000 + row % 8,
            1 + row % 9,
            row % 10,
            2018 + row % 6,
            schools[row % schools.len()],
            if row % 2 == 0 { "SI" } else { "NO" },
            if row % 2 == 0 { "F" } else { "M" },
            row
        ));
    }
    csv
}

pub(super) fn write_upload(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write upload");
    file.flush().expect("flush upload");
    file
}
