//! Error types for formcalc-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while assembling a form definition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    /// Field name is empty or not a valid identifier
    #[error("Invalid field name: {0:?}")]
    InvalidFieldName(String),

    /// Field name exceeds the descriptor limit
    #[error("Field name too long: {0} ({1} chars, max {2})")]
    FieldNameTooLong(String, usize, usize),

    /// Two descriptors share the same name
    #[error("Duplicate field: {0}")]
    DuplicateField(String),

    /// Reference to a field that was never registered
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// A calculated descriptor is missing its formula
    #[error("Calculated field {0} has no formula")]
    MissingFormula(String),
}
