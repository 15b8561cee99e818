//! Error type for the boundary of the pricing library
//!
//! Pricing itself never fails: an unavailable product is `None` and an
//! unaffordable loan is a flagged result. Errors only come from parsing
//! caller-supplied labels and loading configuration files.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("Unknown criteria question '{id}' for {category}")]
    UnknownQuestion { category: String, id: String },

    #[error("Option '{answer}' is not offered by question '{id}'")]
    InvalidAnswer { id: String, answer: String },

    #[error("Unknown {kind}: '{value}'")]
    UnknownLabel { kind: &'static str, value: String },

    #[error("Invalid fee column '{0}'")]
    InvalidFeeColumn(String),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PricingError {
    pub(crate) fn unknown(kind: &'static str, value: &str) -> Self {
        PricingError::UnknownLabel {
            kind,
            value: value.to_string(),
        }
    }
}
