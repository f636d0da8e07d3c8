use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Column names shared by uploads, the historical dataset, and the model schema.
pub mod columns {
    pub const BIRTH_DATE: &str = "FECHA_NAC";
    pub const EVALUATION_YEAR: &str = "ANIO";
    pub const BACHELOR_YEAR: &str = "ANIO_BACHILLERATO";
    pub const INSTITUTION: &str = "NOMBRE_COLEGIO";
    pub const INSTITUTION_CITY: &str = "CIUDAD_COLEGIO";
    pub const INSTITUTION_PROVINCE: &str = "PROVINCIA_COLEGIO";
    pub const MARITAL_STATUS: &str = "ESTADO_CIVIL";
    pub const NATIONALITY: &str = "NACIONALIDAD";
    pub const WORKED: &str = "TRABAJA";
    pub const SCHOOL_TYPE: &str = "TIPO_COLEGIO";
    pub const ADMISSION_OPTION: &str = "OPC_INGRESO";
    pub const PERIOD: &str = "PERIODO";
    pub const SEX: &str = "SEXO";
    pub const MUNICIPALITY: &str = "MUNICIPIO";
    pub const OUTCOME: &str = "RESULTADO_FINAL";

    pub const AGE: &str = "EDAD";
    pub const IS_ADULT: &str = "MAYOR_EDAD";
    pub const YEARS_AFTER_SECONDARY: &str = "ANIOS_POST_BACH";
    pub const SCHOOL_TYPE_COMPOSITE: &str = "TRABAJO_COLEGIO";
    pub const MIGRATED: &str = "MIGRA_UNIVERSIDAD";
    pub const INSTITUTION_RATE: &str = "TASA_APR_COLEGIO";

    pub const PREDICTION: &str = "PREDICCION";
    pub const PROBABILITY: &str = "PROBABILIDAD";
}

/// Columns an upload must carry before a batch job will derive anything.
pub const REQUIRED_UPLOAD_COLUMNS: [&str; 10] = [
    columns::BIRTH_DATE,
    columns::EVALUATION_YEAR,
    columns::BACHELOR_YEAR,
    columns::INSTITUTION,
    columns::INSTITUTION_CITY,
    columns::INSTITUTION_PROVINCE,
    columns::MARITAL_STATUS,
    columns::NATIONALITY,
    columns::WORKED,
    columns::SCHOOL_TYPE,
];

/// Untyped cell value as read from an upload, the historical dataset, or a JSON record.
/// JSON booleans read as `Number(1.0)` / `Number(0.0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Missing,
    Number(#[serde(deserialize_with = "number_or_flag")] f64),
    Date(NaiveDate),
    Text(String),
}

fn number_or_flag<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrFlag {
        Number(f64),
        Flag(bool),
    }

    Ok(match NumberOrFlag::deserialize(deserializer)? {
        NumberOrFlag::Number(value) => value,
        NumberOrFlag::Flag(flag) => f64::from(u8::from(flag)),
    })
}

impl RawValue {
    /// Interpret a CSV cell. Dates stay textual until a date is asked for.
    pub fn parse(cell: &str) -> Self {
        let trimmed = cell.trim();
        if trimmed.is_empty() {
            return RawValue::Missing;
        }

        match trimmed.parse::<f64>() {
            Ok(number) if number.is_finite() => RawValue::Number(number),
            _ => RawValue::Text(trimmed.to_string()),
        }
    }

    pub fn is_missing(&self) -> bool {
        match self {
            RawValue::Missing => true,
            RawValue::Text(text) => text.trim().is_empty(),
            RawValue::Number(number) => !number.is_finite(),
            RawValue::Date(_) => false,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(number) if number.is_finite() => Some(*number),
            RawValue::Text(text) => text
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|number| number.is_finite()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            RawValue::Missing => None,
            RawValue::Text(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            RawValue::Number(number) if number.is_finite() => Some(format_number(*number)),
            RawValue::Number(_) => None,
            RawValue::Date(date) => Some(date.format("%Y-%m-%d").to_string()),
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            RawValue::Date(date) => Some(*date),
            RawValue::Text(text) => parse_date(text),
            _ => None,
        }
    }
}

/// Render a number the way a spreadsheet shows it: integral values without a fraction.
pub(crate) fn format_number(number: f64) -> String {
    if number.fract() == 0.0 && number.abs() < 1e15 {
        format!("{}", number as i64)
    } else {
        format!("{number}")
    }
}

/// Accepts the date shapes spreadsheets and dataframe exports produce. Anything else is
/// treated as missing rather than as an error.
pub(crate) fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }

    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc().date());
    }

    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y").ok()
}

/// One applicant as a mapping from column name to raw value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicantRecord {
    fields: BTreeMap<String, RawValue>,
}

impl ApplicantRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: RawValue) -> Self {
        self.insert(column, value);
        self
    }

    pub fn with_text(self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.with(column, RawValue::Text(value.into()))
    }

    pub fn with_number(self, column: impl Into<String>, value: f64) -> Self {
        self.with(column, RawValue::Number(value))
    }

    pub fn with_date(self, column: impl Into<String>, value: NaiveDate) -> Self {
        self.with(column, RawValue::Date(value))
    }

    pub fn insert(&mut self, column: impl Into<String>, value: RawValue) {
        self.fields.insert(column.into(), value);
    }

    /// Present, non-missing value for a column.
    pub fn get(&self, column: &str) -> Option<&RawValue> {
        self.fields.get(column).filter(|value| !value.is_missing())
    }

    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(RawValue::as_text)
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(RawValue::as_number)
    }

    pub fn date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).and_then(RawValue::as_date)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.fields
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, RawValue)> for ApplicantRecord {
    fn from_iter<T: IntoIterator<Item = (K, RawValue)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value))
                .collect(),
        }
    }
}

/// Binary label returned by the oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PredictionLabel {
    Approved,
    NotApproved,
}

impl PredictionLabel {
    /// Label written into the `PREDICCION` column of a scored table.
    pub fn output_label(self) -> &'static str {
        match self {
            PredictionLabel::Approved => "APROBADO",
            PredictionLabel::NotApproved => "NO APROBADO",
        }
    }
}

/// Oracle verdict for one applicant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub label: PredictionLabel,
    /// Probability of the positive (approved) class.
    pub probability: f64,
}
