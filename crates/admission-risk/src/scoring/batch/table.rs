use crate::scoring::domain::{columns, PredictionLabel, PredictionResult};
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// One input row echoed verbatim, with its prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRow {
    pub cells: Vec<String>,
    pub prediction: PredictionResult,
}

/// Scored upload: the original columns followed by `PREDICCION` and `PROBABILIDAD`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    headers: Vec<String>,
    rows: Vec<ScoredRow>,
}

impl ResultTable {
    /// Pairs rows with predictions positionally; callers guarantee equal lengths.
    /// Prediction columns already present in the input are replaced, not duplicated.
    pub(crate) fn new(
        input_headers: Vec<String>,
        input_rows: Vec<Vec<String>>,
        predictions: Vec<PredictionResult>,
    ) -> Self {
        let stale: Vec<usize> = input_headers
            .iter()
            .enumerate()
            .filter(|(_, header)| is_prediction_column(header))
            .map(|(position, _)| position)
            .collect();

        let mut headers = without_positions(input_headers, &stale);
        headers.push(columns::PREDICTION.to_string());
        headers.push(columns::PROBABILITY.to_string());

        let rows = input_rows
            .into_iter()
            .zip(predictions)
            .map(|(cells, prediction)| ScoredRow {
                cells: without_positions(cells, &stale),
                prediction,
            })
            .collect();

        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[ScoredRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count of rows predicted approved.
    pub fn approved(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.prediction.label == PredictionLabel::Approved)
            .count()
    }

    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.headers)?;
        for row in &self.rows {
            let probability = row.prediction.probability.to_string();
            csv_writer.write_record(
                row.cells
                    .iter()
                    .map(String::as_str)
                    .chain([row.prediction.label.output_label(), probability.as_str()]),
            )?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}

fn is_prediction_column(header: &str) -> bool {
    let header = header.trim();
    header == columns::PREDICTION || header == columns::PROBABILITY
}

fn without_positions(cells: Vec<String>, positions: &[usize]) -> Vec<String> {
    if positions.is_empty() {
        return cells;
    }
    cells
        .into_iter()
        .enumerate()
        .filter(|(position, _)| !positions.contains(position))
        .map(|(_, cell)| cell)
        .collect()
}
