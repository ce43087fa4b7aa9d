use curelog_core::SoapKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no soap named {0}")]
    UnknownSoap(SoapKey),

    #[error("soap {0} already exists")]
    DuplicateSoap(SoapKey),

    #[error("invalid record: {0}")]
    Invalid(String),

    #[error("row has {got} cells, sheet {sheet} has {expected} columns")]
    RowWidth {
        sheet: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "duckdb")]
    #[error("duckdb error: {0}")]
    DuckDb(#[from] ::duckdb::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}
