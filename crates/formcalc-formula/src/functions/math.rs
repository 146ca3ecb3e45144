//! Math functions

use crate::error::{FormulaError, FormulaResult};
use formcalc_core::FieldValue;

/// SUM function
///
/// Non-numeric and null arguments count as 0, so a sum over untouched
/// inputs is 0 rather than an error.
pub fn fn_sum(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let sum: f64 = args.iter().map(|v| v.as_number().unwrap_or(0.0)).sum();
    Ok(FieldValue::Number(sum))
}

/// AVG function
///
/// Arithmetic mean over the arguments with the same coercion as SUM.
/// An empty argument list yields 0, not an error.
pub fn fn_avg(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    if args.is_empty() {
        return Ok(FieldValue::Number(0.0));
    }

    let sum: f64 = args.iter().map(|v| v.as_number().unwrap_or(0.0)).sum();
    Ok(FieldValue::Number(sum / args.len() as f64))
}

/// MIN function
pub fn fn_min(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let min = args
        .iter()
        .filter_map(|v| v.as_number())
        .fold(None, |acc: Option<f64>, n| {
            Some(acc.map_or(n, |m| m.min(n)))
        });

    Ok(FieldValue::Number(min.unwrap_or(0.0)))
}

/// MAX function
pub fn fn_max(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let max = args
        .iter()
        .filter_map(|v| v.as_number())
        .fold(None, |acc: Option<f64>, n| {
            Some(acc.map_or(n, |m| m.max(n)))
        });

    Ok(FieldValue::Number(max.unwrap_or(0.0)))
}

/// COUNT function
///
/// Counts the arguments that hold a numeric value (null and non-numeric
/// text are skipped).
pub fn fn_count(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let count = args
        .iter()
        .filter(|v| !v.is_null() && v.as_number().is_some())
        .count();

    Ok(FieldValue::Number(count as f64))
}

/// ROUND function
///
/// Rounds half away from zero at the given number of decimal digits
/// (default 0). Negative digits round to the left of the decimal point.
pub fn fn_round(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let number = number_arg(args, 0, "ROUND")?;

    let num_digits = match args.get(1) {
        Some(v) => match v.as_number() {
            Some(n) => n as i32,
            None => {
                return Err(FormulaError::TypeMismatch {
                    expected: "number",
                    found: format!("{:?}", v),
                })
            }
        },
        None => 0,
    };

    let multiplier = 10_f64.powi(num_digits);

    // Round half away from zero:
    // round(2.5) = 3, round(-2.5) = -3
    let result = if number >= 0.0 {
        (number * multiplier + 0.5).floor() / multiplier
    } else {
        (number * multiplier - 0.5).ceil() / multiplier
    };

    Ok(FieldValue::Number(result))
}

/// ABS function
pub fn fn_abs(args: &[FieldValue]) -> FormulaResult<FieldValue> {
    let number = number_arg(args, 0, "ABS")?;
    Ok(FieldValue::Number(number.abs()))
}

/// Fetch a required numeric argument
fn number_arg(args: &[FieldValue], index: usize, function: &str) -> FormulaResult<f64> {
    let value = args
        .get(index)
        .ok_or_else(|| FormulaError::ArgumentCount {
            function: function.to_string(),
            expected: format!("at least {}", index + 1),
            actual: args.len(),
        })?;

    value.as_number().ok_or_else(|| FormulaError::TypeMismatch {
        expected: "number",
        found: format!("{:?}", value),
    })
}
