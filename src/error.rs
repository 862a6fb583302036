use thiserror::Error;

use crate::models::DatasetKind;

#[derive(Error, Debug)]
pub enum StockError {
    #[error("No data found for {0}. Please load a file first.")]
    MissingDataset(DatasetKind),

    #[error("No data after filtering.")]
    EmptyFilterResult,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "xlsx")]
    #[error("XLSX error: {0}")]
    Xlsx(#[from] calamine::Error),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl StockError {
    /// Conditions the user resolves by loading data or changing filters.
    /// These are reported as warnings, not failures.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::MissingDataset(_) | Self::EmptyFilterResult)
    }
}

pub type Result<T> = std::result::Result<T, StockError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_class() {
        assert!(StockError::EmptyFilterResult.is_warning());
        assert!(StockError::MissingDataset(DatasetKind::ReceiveShip).is_warning());
        assert!(!StockError::InvalidFilter("month 13".into()).is_warning());
        assert!(!StockError::Other("boom".into()).is_warning());
    }

    #[test]
    fn test_missing_dataset_message() {
        let msg = StockError::MissingDataset(DatasetKind::DailyStock).to_string();
        assert_eq!(msg, "No data found for daily_stock_data. Please load a file first.");
    }
}
