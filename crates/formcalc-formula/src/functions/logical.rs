//! Logical functions

use crate::error::{FormulaError, FormulaResult};
use formcalc_core::FieldValue;

/// IF function
///
/// `IF(condition, when_true, when_false)`. The condition must coerce to a
/// boolean; numbers coerce as `n != 0`.
pub fn fn_if(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let condition = args.first().ok_or_else(|| FormulaError::ArgumentCount {
        function: "IF".to_string(),
        expected: "3".to_string(),
        actual: args.len(),
    })?;

    let taken = condition.as_bool().ok_or_else(|| FormulaError::TypeMismatch {
        expected: "boolean",
        found: format!("{:?}", condition),
    })?;

    let index = if taken { 1 } else { 2 };
    args.get(index)
        .cloned()
        .ok_or_else(|| FormulaError::ArgumentCount {
            function: "IF".to_string(),
            expected: "3".to_string(),
            actual: args.len(),
        })
}
