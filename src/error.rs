use crate::advisory::AdvisoryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("Invalid statement structure: {0}")]
    Structure(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet could not be read: {0}")]
    Spreadsheet(String),

    #[error("Advisory call failed: {0}")]
    Advisory(#[from] AdvisoryError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
