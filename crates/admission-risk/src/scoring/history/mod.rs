mod dataset;
mod rates;
mod summary;

pub use dataset::{HistoricalDataset, OutcomeLabels};
pub use rates::HistoricalRateIndex;
pub use summary::{ColumnKind, ColumnSummary, DatasetSummary, NumericStats};
