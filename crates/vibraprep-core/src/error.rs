use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("{stage} needs at least {required} row(s), found {found}")]
    InsufficientData {
        stage: &'static str,
        required: usize,
        found: usize,
    },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] PolarsError),
}

impl PreprocessError {
    /// Missing or unusable input columns, or nothing left after parsing.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            PreprocessError::Validation(_) | PreprocessError::MissingColumn { .. }
        )
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PreprocessError::InsufficientData { .. })
    }
}

pub type Result<T> = std::result::Result<T, PreprocessError>;
