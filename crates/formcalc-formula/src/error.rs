//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula registration or evaluation
#[derive(Debug, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Identifier does not resolve to a registered field
    #[error("Unknown identifier: {0}")]
    UnknownIdentifier(String),

    /// Function name not in the fixed vocabulary
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
    },

    /// Operand has the wrong type for an operator or function
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Division or modulo by zero
    #[error("Division by zero")]
    DivisionByZero,

    /// Registering this formula would create a dependency cycle
    #[error("Circular dependency involving field {0}")]
    CircularDependency(String),

    /// Form definition error (bad name, duplicate, missing formula)
    #[error(transparent)]
    Field(#[from] formcalc_core::Error),
}
