//! Error types for the extraction pipeline.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("no element matches {0}")]
    NoMatch(String),

    #[error("invalid selector {0}")]
    InvalidSelector(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
