//! Error types for complaint aggregation.

use std::fmt;
use thiserror::Error;

/// Which free-text field of a complaint record failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Product,
    Company,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Product => write!(f, "product"),
            Field::Company => write!(f, "company"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ComplaintError {
    /// One or more required columns are absent from the input header
    #[error("The csv is missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    /// Product or company is blank or a null token
    #[error("\"{value}\" is not a valid {field}")]
    InvalidField { field: Field, value: String },

    /// The year prefix of the date field is not an integer
    #[error("\"{value}\" is not a valid year")]
    InvalidYear { value: String },

    /// Malformed CSV framing
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ComplaintError {
    /// True for errors caused by the content of the input rather than
    /// by reading or writing it.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ComplaintError::MissingColumns(_)
                | ComplaintError::InvalidField { .. }
                | ComplaintError::InvalidYear { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ComplaintError>;
