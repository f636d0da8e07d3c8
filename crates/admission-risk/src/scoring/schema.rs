use super::domain::columns;
use super::error::DataFormatError;
use super::features::FeatureValue;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Category used when a categorical model column has no value.
pub const UNKNOWN_CATEGORY: &str = "DESCONOCIDO";

/// Feature columns the engine knows how to produce or pass through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureColumn {
    Period,
    Sex,
    AdmissionOption,
    InstitutionCity,
    InstitutionProvince,
    BachelorYear,
    Municipality,
    Nationality,
    MaritalStatus,
    Age,
    YearsAfterSecondary,
    SchoolTypeComposite,
    IsAdult,
    MigratedForUniversity,
    InstitutionRate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureKind {
    Numeric,
    Categorical,
}

impl FeatureColumn {
    pub const ALL: [FeatureColumn; 15] = [
        FeatureColumn::Period,
        FeatureColumn::Sex,
        FeatureColumn::AdmissionOption,
        FeatureColumn::InstitutionCity,
        FeatureColumn::InstitutionProvince,
        FeatureColumn::BachelorYear,
        FeatureColumn::Municipality,
        FeatureColumn::Nationality,
        FeatureColumn::MaritalStatus,
        FeatureColumn::Age,
        FeatureColumn::YearsAfterSecondary,
        FeatureColumn::SchoolTypeComposite,
        FeatureColumn::IsAdult,
        FeatureColumn::MigratedForUniversity,
        FeatureColumn::InstitutionRate,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FeatureColumn::Period => columns::PERIOD,
            FeatureColumn::Sex => columns::SEX,
            FeatureColumn::AdmissionOption => columns::ADMISSION_OPTION,
            FeatureColumn::InstitutionCity => columns::INSTITUTION_CITY,
            FeatureColumn::InstitutionProvince => columns::INSTITUTION_PROVINCE,
            FeatureColumn::BachelorYear => columns::BACHELOR_YEAR,
            FeatureColumn::Municipality => columns::MUNICIPALITY,
            FeatureColumn::Nationality => columns::NATIONALITY,
            FeatureColumn::MaritalStatus => columns::MARITAL_STATUS,
            FeatureColumn::Age => columns::AGE,
            FeatureColumn::YearsAfterSecondary => columns::YEARS_AFTER_SECONDARY,
            FeatureColumn::SchoolTypeComposite => columns::SCHOOL_TYPE_COMPOSITE,
            FeatureColumn::IsAdult => columns::IS_ADULT,
            FeatureColumn::MigratedForUniversity => columns::MIGRATED,
            FeatureColumn::InstitutionRate => columns::INSTITUTION_RATE,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|column| column.name() == name)
    }

    pub fn kind(self) -> FeatureKind {
        match self {
            FeatureColumn::Period
            | FeatureColumn::AdmissionOption
            | FeatureColumn::BachelorYear
            | FeatureColumn::Age
            | FeatureColumn::YearsAfterSecondary
            | FeatureColumn::IsAdult
            | FeatureColumn::MigratedForUniversity
            | FeatureColumn::InstitutionRate => FeatureKind::Numeric,
            FeatureColumn::Sex
            | FeatureColumn::InstitutionCity
            | FeatureColumn::InstitutionProvince
            | FeatureColumn::Municipality
            | FeatureColumn::Nationality
            | FeatureColumn::MaritalStatus
            | FeatureColumn::SchoolTypeComposite => FeatureKind::Categorical,
        }
    }

    /// Value used when the applicant supplies nothing for this column.
    pub fn default_value(self) -> FeatureValue {
        match self {
            FeatureColumn::SchoolTypeComposite => {
                FeatureValue::Category(super::features::DEFAULT_SCHOOL_TYPE_COMPOSITE.to_string())
            }
            column => match column.kind() {
                FeatureKind::Numeric => FeatureValue::Numeric(0.0),
                FeatureKind::Categorical => FeatureValue::Category(UNKNOWN_CATEGORY.to_string()),
            },
        }
    }
}

/// One position in the model's input row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaSlot {
    Known(FeatureColumn),
    /// A model column outside the known set; passed through, zero when absent.
    Passthrough(String),
}

impl SchemaSlot {
    pub fn name(&self) -> &str {
        match self {
            SchemaSlot::Known(column) => column.name(),
            SchemaSlot::Passthrough(name) => name,
        }
    }

    pub fn default_value(&self) -> FeatureValue {
        match self {
            SchemaSlot::Known(column) => column.default_value(),
            SchemaSlot::Passthrough(_) => FeatureValue::Numeric(0.0),
        }
    }
}

/// The model's declared column order, resolved once against the known feature columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureSchema {
    slots: Vec<SchemaSlot>,
}

impl FeatureSchema {
    pub fn resolve<S: AsRef<str>>(columns: &[S]) -> Result<Self, DataFormatError> {
        if columns.is_empty() {
            return Err(DataFormatError::EmptyColumnList);
        }

        let mut seen = HashSet::new();
        let mut slots = Vec::with_capacity(columns.len());
        for column in columns {
            let name = column.as_ref().trim();
            if !seen.insert(name.to_string()) {
                return Err(DataFormatError::DuplicateColumn(name.to_string()));
            }

            match FeatureColumn::from_name(name) {
                Some(known) => slots.push(SchemaSlot::Known(known)),
                None => {
                    warn!(column = name, "model column is not a known feature; zero-filled when absent");
                    slots.push(SchemaSlot::Passthrough(name.to_string()));
                }
            }
        }

        debug!(width = slots.len(), "resolved model feature schema");
        Ok(Self { slots })
    }

    pub fn slots(&self) -> &[SchemaSlot] {
        &self.slots
    }

    pub fn column_names(&self) -> Vec<String> {
        self.slots.iter().map(|slot| slot.name().to_string()).collect()
    }

    pub fn width(&self) -> usize {
        self.slots.len()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.slots.iter().any(|slot| slot.name() == column)
    }
}

/// Kind used when a raw value passes through under this column name.
pub(crate) fn kind_of(column: &str) -> Option<FeatureKind> {
    FeatureColumn::from_name(column).map(FeatureColumn::kind)
}
