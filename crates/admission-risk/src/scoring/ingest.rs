use super::domain::{ApplicantRecord, RawValue};
use super::error::DataFormatError;
use std::io::Read;
use std::path::Path;

/// Header row plus raw cells, kept verbatim so scored output can echo the input.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Table {
    pub(crate) headers: Vec<String>,
    pub(crate) rows: Vec<Vec<String>>,
}

impl Table {
    pub(crate) fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|header| header == column)
    }

    pub(crate) fn records(&self) -> Vec<ApplicantRecord> {
        self.rows
            .iter()
            .map(|row| {
                self.headers
                    .iter()
                    .zip(row.iter())
                    .map(|(header, cell)| (header.clone(), RawValue::parse(cell)))
                    .collect()
            })
            .collect()
    }

    /// Fail on the first required column the header row lacks.
    pub(crate) fn require_columns(
        &self,
        required: &[&str],
        origin: &str,
    ) -> Result<(), DataFormatError> {
        match required.iter().find(|column| !self.has_column(column)) {
            Some(column) => Err(DataFormatError::MissingColumn {
                origin: origin.to_string(),
                column: (*column).to_string(),
            }),
            None => Ok(()),
        }
    }
}

pub(crate) fn read_table_from_path<P: AsRef<Path>>(
    path: P,
    origin: &str,
) -> Result<Table, DataFormatError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|err| DataFormatError::Unreadable {
        origin: origin.to_string(),
        message: format!("{}: {}", path.display(), err),
    })?;
    read_table(file, origin)
}

pub(crate) fn read_table<R: Read>(reader: R, origin: &str) -> Result<Table, DataFormatError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = csv_reader
        .headers()
        .map_err(|err| DataFormatError::Unreadable {
            origin: origin.to_string(),
            message: err.to_string(),
        })?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();

    let mut rows = Vec::new();
    for (index, record) in csv_reader.records().enumerate() {
        let record = record.map_err(|err| DataFormatError::MalformedRow {
            origin: origin.to_string(),
            row: index + 1,
            message: err.to_string(),
        })?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table { headers, rows })
}

fn normalize_header(value: &str) -> String {
    value.replace(['\u{feff}', '\u{200b}'], "").trim().to_string()
}
