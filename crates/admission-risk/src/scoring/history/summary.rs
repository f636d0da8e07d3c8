use super::dataset::HistoricalDataset;
use crate::scoring::domain::RawValue;
use serde::Serialize;

/// Shape of a column's present values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Numeric,
    Text,
    Date,
    Mixed,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NumericStats {
    pub count: usize,
    pub mean: f64,
    /// Sample standard deviation; `None` with fewer than two values.
    pub std_dev: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub name: String,
    pub kind: ColumnKind,
    pub non_null: usize,
    pub nulls: usize,
    pub null_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub numeric: Option<NumericStats>,
}

/// Per-column overview of the historical dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub columns: Vec<ColumnSummary>,
}

impl DatasetSummary {
    pub fn from_dataset(dataset: &HistoricalDataset) -> Self {
        let rows = dataset.len();
        let columns = dataset
            .headers()
            .iter()
            .map(|header| summarize_column(dataset, header, rows))
            .collect();
        Self { rows, columns }
    }

    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|column| column.name == name)
    }
}

fn summarize_column(dataset: &HistoricalDataset, name: &str, rows: usize) -> ColumnSummary {
    let mut numbers = Vec::new();
    let (mut texts, mut dates) = (0usize, 0usize);

    for value in dataset.records().iter().filter_map(|record| record.get(name)) {
        match value {
            RawValue::Number(number) => numbers.push(*number),
            RawValue::Date(_) => dates += 1,
            RawValue::Text(text) if value.as_date().is_some() && !text.is_empty() => dates += 1,
            RawValue::Text(_) => texts += 1,
            RawValue::Missing => {}
        }
    }

    let non_null = numbers.len() + texts + dates;
    let kind = match (numbers.is_empty(), texts, dates) {
        (true, 0, 0) => ColumnKind::Empty,
        (false, 0, 0) => ColumnKind::Numeric,
        (true, _, 0) => ColumnKind::Text,
        (true, 0, _) => ColumnKind::Date,
        _ => ColumnKind::Mixed,
    };

    let nulls = rows - non_null;
    let null_pct = if rows == 0 {
        0.0
    } else {
        (nulls as f64 / rows as f64 * 100.0 * 100.0).round() / 100.0
    };

    ColumnSummary {
        name: name.to_string(),
        kind,
        non_null,
        nulls,
        null_pct,
        numeric: numeric_stats(&numbers),
    }
}

fn numeric_stats(values: &[f64]) -> Option<NumericStats> {
    if values.is_empty() {
        return None;
    }

    let count = values.len();
    let mean = values.iter().sum::<f64>() / count as f64;
    let std_dev = (count > 1).then(|| {
        let variance =
            values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    });
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    Some(NumericStats {
        count,
        mean,
        std_dev,
        min,
        max,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::history::OutcomeLabels;
    use std::io::Cursor;

    #[test]
    fn summarizes_kinds_nulls_and_numeric_stats() {
        let dataset = HistoricalDataset::from_reader(
            Cursor::new(
                "EDAD,SEXO,FECHA_NAC,NOTAS\n\
18,M,2005-03-15,\n\
20,,2004-07-01,\n\
,F,2003-01-01,\n\
22,M,,\n",
            ),
            OutcomeLabels::default(),
        )
        .expect("dataset parses");

        let summary = DatasetSummary::from_dataset(&dataset);
        assert_eq!(summary.rows, 4);

        let age = summary.column("EDAD").expect("age column");
        assert_eq!(age.kind, ColumnKind::Numeric);
        assert_eq!(age.nulls, 1);
        assert_eq!(age.null_pct, 25.0);
        let stats = age.numeric.as_ref().expect("numeric stats");
        assert_eq!(stats.count, 3);
        assert_eq!(stats.mean, 20.0);
        assert_eq!(stats.std_dev, Some(2.0));
        assert_eq!((stats.min, stats.max), (18.0, 22.0));

        assert_eq!(summary.column("SEXO").expect("sex").kind, ColumnKind::Text);
        assert_eq!(
            summary.column("FECHA_NAC").expect("birth").kind,
            ColumnKind::Date
        );

        let notes = summary.column("NOTAS").expect("notes");
        assert_eq!(notes.kind, ColumnKind::Empty);
        assert_eq!(notes.null_pct, 100.0);
        assert!(notes.numeric.is_none());
    }
}
