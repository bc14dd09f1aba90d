use thiserror::Error;

/// Errors raised while loading data, estimating parameters or classifying rows.
#[derive(Error, Debug)]
pub enum BayesError {
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("insufficient data for class {label}: {count} example(s), at least 2 required")]
    InsufficientData { label: &'static str, count: usize },

    #[error("invalid variance {variance}: must be strictly positive")]
    InvalidVariance { variance: f64 },

    #[error("row {row}: missing value in column {column}")]
    MissingValue { row: u64, column: &'static str },

    #[error("row {row}: invalid value {value:?} in column {column}")]
    InvalidValue {
        row: u64,
        column: &'static str,
        value: String,
    },

    #[error("row {row}: unknown label {value:?}")]
    UnknownLabel { row: u64, value: String },

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, BayesError>;
