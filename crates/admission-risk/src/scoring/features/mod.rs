//! Turns raw applicant records into the model's fixed-width feature rows.

mod rules;

use super::domain::{columns, ApplicantRecord, RawValue};
use super::error::InvalidFieldError;
use super::history::HistoricalRateIndex;
use super::schema::{kind_of, FeatureKind, FeatureSchema};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

pub(crate) const DEFAULT_SCHOOL_TYPE_COMPOSITE: &str = "NO_DESCONOCIDO";

pub const DEFAULT_REFERENCE_CITY: &str = "COCHABAMBA";
pub const DEFAULT_REFERENCE_PROVINCE: &str = "COCHABAMBA (CERCADO)";

/// Value of one feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Numeric(f64),
    Category(String),
}

impl FeatureValue {
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            FeatureValue::Numeric(value) => Some(*value),
            FeatureValue::Category(_) => None,
        }
    }

    pub fn as_category(&self) -> Option<&str> {
        match self {
            FeatureValue::Category(value) => Some(value),
            FeatureValue::Numeric(_) => None,
        }
    }
}

impl fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureValue::Numeric(value) => write!(f, "{value}"),
            FeatureValue::Category(value) => f.write_str(value),
        }
    }
}

/// How age is counted for an evaluation year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgeConvention {
    /// Subtract one year when the birthday falls after the cutoff day.
    ExactBirthday { cutoff_month: u32, cutoff_day: u32 },
    /// Plain difference of calendar years.
    CalendarYear,
}

impl Default for AgeConvention {
    fn default() -> Self {
        AgeConvention::ExactBirthday {
            cutoff_month: 1,
            cutoff_day: 1,
        }
    }
}

impl FromStr for AgeConvention {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact-birthday" | "exact" => Ok(AgeConvention::default()),
            "calendar-year" | "calendar" => Ok(AgeConvention::CalendarYear),
            other => Err(format!(
                "unknown age convention '{other}' (expected exact-birthday or calendar-year)"
            )),
        }
    }
}

/// Fixed inputs to derivation that do not come from the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivationSettings {
    pub reference_city: String,
    pub reference_province: String,
    pub age_convention: AgeConvention,
    /// Used when a record carries no usable `ANIO`.
    pub default_evaluation_year: i32,
}

impl DerivationSettings {
    pub fn new(default_evaluation_year: i32) -> Self {
        Self {
            reference_city: DEFAULT_REFERENCE_CITY.to_string(),
            reference_province: DEFAULT_REFERENCE_PROVINCE.to_string(),
            age_convention: AgeConvention::default(),
            default_evaluation_year,
        }
    }
}

/// Every raw and derived value for one applicant, before reindexing to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DerivedApplicant {
    values: BTreeMap<String, FeatureValue>,
}

impl DerivedApplicant {
    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.values.get(column)
    }

    pub fn numeric(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FeatureValue::as_numeric)
    }

    pub fn category(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(FeatureValue::as_category)
    }

    pub fn institution_rate(&self) -> f64 {
        self.numeric(columns::INSTITUTION_RATE).unwrap_or(0.0)
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values
            .iter()
            .map(|(column, value)| (column.as_str(), value))
    }

    /// Project onto the model's column order, defaulting absent columns.
    pub fn reindex(&self, schema: &FeatureSchema) -> FeatureVector {
        let entries = schema
            .slots()
            .iter()
            .map(|slot| {
                let value = self
                    .values
                    .get(slot.name())
                    .cloned()
                    .unwrap_or_else(|| slot.default_value());
                (slot.name().to_string(), value)
            })
            .collect();
        FeatureVector { entries }
    }
}

/// Model input row: exactly the schema's columns, in the schema's order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    entries: Vec<(String, FeatureValue)>,
}

impl FeatureVector {
    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &FeatureValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn into_values(self) -> Vec<FeatureValue> {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Stateless deriver bound to the model schema and the fixed derivation settings.
#[derive(Debug, Clone)]
pub struct FeatureDeriver {
    schema: FeatureSchema,
    settings: DerivationSettings,
}

impl FeatureDeriver {
    pub fn new(schema: FeatureSchema, settings: DerivationSettings) -> Self {
        Self { schema, settings }
    }

    pub fn schema(&self) -> &FeatureSchema {
        &self.schema
    }

    pub fn settings(&self) -> &DerivationSettings {
        &self.settings
    }

    /// The record's own `ANIO`, else the configured default.
    pub fn evaluation_year_for(&self, record: &ApplicantRecord) -> i32 {
        record
            .number(columns::EVALUATION_YEAR)
            .and_then(rules::whole_year)
            .unwrap_or(self.settings.default_evaluation_year)
    }

    pub fn derive(
        &self,
        record: &ApplicantRecord,
        index: &HistoricalRateIndex,
        evaluation_year: i32,
    ) -> Result<FeatureVector, InvalidFieldError> {
        let derived = self.derive_fields(record, index, evaluation_year)?;
        Ok(derived.reindex(&self.schema))
    }

    /// Derive every record independently, each with its own evaluation year.
    pub fn derive_all(
        &self,
        records: &[ApplicantRecord],
        index: &HistoricalRateIndex,
    ) -> Result<Vec<FeatureVector>, InvalidFieldError> {
        records
            .iter()
            .enumerate()
            .map(|(position, record)| {
                let year = self.evaluation_year_for(record);
                self.derive(record, index, year)
                    .map_err(|err| err.at_row(position + 1))
            })
            .collect()
    }

    /// Raw fields passed through by declared kind, then the derived features on top.
    pub fn derive_fields(
        &self,
        record: &ApplicantRecord,
        index: &HistoricalRateIndex,
        evaluation_year: i32,
    ) -> Result<DerivedApplicant, InvalidFieldError> {
        let institution = record
            .text(columns::INSTITUTION)
            .ok_or(InvalidFieldError::Missing {
                field: columns::INSTITUTION,
            })?;

        let mut values = BTreeMap::new();
        for (column, raw) in record.fields() {
            if let Some(value) = passthrough_value(column, raw) {
                values.insert(column.to_string(), value);
            }
        }

        let age = rules::age_at(
            record.date(columns::BIRTH_DATE),
            evaluation_year,
            self.settings.age_convention,
        );
        let years_after = rules::years_after_secondary(
            evaluation_year,
            record.number(columns::BACHELOR_YEAR),
        );
        let worked = record.text(columns::WORKED);
        let school_type = record.text(columns::SCHOOL_TYPE);
        let composite = rules::school_type_composite(worked.as_deref(), school_type.as_deref());
        let city = record.text(columns::INSTITUTION_CITY);
        let province = record.text(columns::INSTITUTION_PROVINCE);
        let migrated = rules::migrated(
            city.as_deref(),
            province.as_deref(),
            &self.settings.reference_city,
            &self.settings.reference_province,
        );
        let rate = index.rate(&institution);

        debug!(
            institution = %institution,
            age,
            years_after,
            migrated,
            rate,
            "derived applicant features"
        );

        values.insert(columns::AGE.to_string(), FeatureValue::Numeric(age as f64));
        values.insert(
            columns::IS_ADULT.to_string(),
            FeatureValue::Numeric(rules::is_adult(age) as f64),
        );
        values.insert(
            columns::YEARS_AFTER_SECONDARY.to_string(),
            FeatureValue::Numeric(years_after as f64),
        );
        values.insert(
            columns::SCHOOL_TYPE_COMPOSITE.to_string(),
            FeatureValue::Category(composite),
        );
        values.insert(
            columns::MIGRATED.to_string(),
            FeatureValue::Numeric(migrated as f64),
        );
        values.insert(
            columns::INSTITUTION_RATE.to_string(),
            FeatureValue::Numeric(rate),
        );

        Ok(DerivedApplicant { values })
    }
}

/// Known numeric columns keep only parseable numbers, known categorical columns keep text,
/// unknown columns keep whichever shape the value has.
fn passthrough_value(column: &str, raw: &RawValue) -> Option<FeatureValue> {
    if raw.is_missing() {
        return None;
    }

    match kind_of(column) {
        Some(FeatureKind::Numeric) => raw.as_number().map(FeatureValue::Numeric),
        Some(FeatureKind::Categorical) => raw.as_text().map(FeatureValue::Category),
        None => raw
            .as_number()
            .map(FeatureValue::Numeric)
            .or_else(|| raw.as_text().map(FeatureValue::Category)),
    }
}
