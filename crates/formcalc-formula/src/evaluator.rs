//! Formula evaluator
//!
//! Evaluates formula ASTs to produce field values.

use crate::ast::{BinaryOperator, FormulaExpr, UnaryOperator};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::FunctionRegistry;
use ahash::AHashMap;
use formcalc_core::FieldValue;
use std::sync::OnceLock;

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

fn get_function_registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

/// Context for formula evaluation
///
/// Holds the snapshot of field values the formula is evaluated against.
/// The engine builds one snapshot per evaluation pass; results therefore
/// depend solely on the snapshot and the formula text.
#[derive(Debug, Default)]
pub struct EvaluationContext {
    values: AHashMap<String, FieldValue>,
}

impl EvaluationContext {
    /// Create an empty context (no fields registered)
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for tests
    pub fn with_value<S: Into<String>, V: Into<FieldValue>>(mut self, name: S, value: V) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Add or replace a field value in the snapshot
    pub fn insert<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.values.insert(name.into(), value);
    }

    /// Look up a field value by name
    pub fn field_value(&self, name: &str) -> FormulaResult<FieldValue> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| FormulaError::UnknownIdentifier(name.to_string()))
    }
}

/// Evaluate a formula expression against a value snapshot
pub fn evaluate(expr: &FormulaExpr, ctx: &EvaluationContext) -> FormulaResult<FieldValue> {
    match expr {
        // === Literals ===
        FormulaExpr::Number(n) => Ok(FieldValue::Number(*n)),
        FormulaExpr::Text(s) => Ok(FieldValue::Text(s.clone())),
        FormulaExpr::Bool(b) => Ok(FieldValue::Bool(*b)),
        FormulaExpr::Null => Ok(FieldValue::Null),

        // === References ===
        FormulaExpr::FieldRef(name) => ctx.field_value(name),

        // === Operators ===
        FormulaExpr::BinaryOp { op, left, right } => evaluate_binary_op(*op, left, right, ctx),

        FormulaExpr::UnaryOp { op, operand } => evaluate_unary_op(*op, operand, ctx),

        // === Functions ===
        FormulaExpr::Function { name, args } => evaluate_function(name, args, ctx),
    }
}

/// Force a value to a number, or report what it actually was
fn to_number(value: &FieldValue) -> FormulaResult<f64> {
    value.as_number().ok_or_else(|| FormulaError::TypeMismatch {
        expected: "number",
        found: type_name(value).to_string(),
    })
}

/// Force a value to a boolean, or report what it actually was
fn to_bool(value: &FieldValue) -> FormulaResult<bool> {
    value.as_bool().ok_or_else(|| FormulaError::TypeMismatch {
        expected: "boolean",
        found: type_name(value).to_string(),
    })
}

fn type_name(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Null => "null",
        FieldValue::Bool(_) => "boolean",
        FieldValue::Number(_) => "number",
        FieldValue::Text(_) => "text",
    }
}

/// Evaluate a binary operation
fn evaluate_binary_op(
    op: BinaryOperator,
    left: &FormulaExpr,
    right: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FieldValue> {
    // Boolean operators short-circuit
    match op {
        BinaryOperator::And => {
            if !to_bool(&evaluate(left, ctx)?)? {
                return Ok(FieldValue::Bool(false));
            }
            return Ok(FieldValue::Bool(to_bool(&evaluate(right, ctx)?)?));
        }
        BinaryOperator::Or => {
            if to_bool(&evaluate(left, ctx)?)? {
                return Ok(FieldValue::Bool(true));
            }
            return Ok(FieldValue::Bool(to_bool(&evaluate(right, ctx)?)?));
        }
        _ => {}
    }

    let left_val = evaluate(left, ctx)?;
    let right_val = evaluate(right, ctx)?;

    match op {
        // '+' concatenates as soon as either side is text, like the text
        // controls the values come from; everything else is numeric
        BinaryOperator::Add => match (&left_val, &right_val) {
            (FieldValue::Text(_), _) | (_, FieldValue::Text(_)) => Ok(FieldValue::Text(
                left_val.to_display_string() + &right_val.to_display_string(),
            )),
            _ => Ok(FieldValue::Number(
                to_number(&left_val)? + to_number(&right_val)?,
            )),
        },
        BinaryOperator::Subtract => Ok(FieldValue::Number(
            to_number(&left_val)? - to_number(&right_val)?,
        )),
        BinaryOperator::Multiply => Ok(FieldValue::Number(
            to_number(&left_val)? * to_number(&right_val)?,
        )),
        BinaryOperator::Divide => {
            let l = to_number(&left_val)?;
            let r = to_number(&right_val)?;
            if r == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(FieldValue::Number(l / r))
            }
        }
        BinaryOperator::Modulo => {
            let l = to_number(&left_val)?;
            let r = to_number(&right_val)?;
            if r == 0.0 {
                Err(FormulaError::DivisionByZero)
            } else {
                Ok(FieldValue::Number(l % r))
            }
        }

        // Comparison operators
        BinaryOperator::Equal => Ok(FieldValue::Bool(
            compare_values(&left_val, &right_val) == 0,
        )),
        BinaryOperator::NotEqual => Ok(FieldValue::Bool(
            compare_values(&left_val, &right_val) != 0,
        )),
        BinaryOperator::LessThan => Ok(FieldValue::Bool(
            compare_values(&left_val, &right_val) < 0,
        )),
        BinaryOperator::LessEqual => Ok(FieldValue::Bool(
            compare_values(&left_val, &right_val) <= 0,
        )),
        BinaryOperator::GreaterThan => Ok(FieldValue::Bool(
            compare_values(&left_val, &right_val) > 0,
        )),
        BinaryOperator::GreaterEqual => Ok(FieldValue::Bool(
            compare_values(&left_val, &right_val) >= 0,
        )),

        BinaryOperator::And | BinaryOperator::Or => unreachable!("handled above"),
    }
}

/// Compare two values for ordering
///
/// Same-type values compare directly; null compares as the number 0; mixed
/// types order as number < text < boolean, keeping comparisons total.
fn compare_values(left: &FieldValue, right: &FieldValue) -> i32 {
    let left = match left {
        FieldValue::Null => &FieldValue::Number(0.0),
        v => v,
    };
    let right = match right {
        FieldValue::Null => &FieldValue::Number(0.0),
        v => v,
    };

    match (left, right) {
        (FieldValue::Number(l), FieldValue::Number(r)) => {
            if l < r {
                -1
            } else if l > r {
                1
            } else {
                0
            }
        }

        // Text compares case-insensitively
        (FieldValue::Text(l), FieldValue::Text(r)) => {
            l.to_lowercase().cmp(&r.to_lowercase()) as i32
        }

        // false < true
        (FieldValue::Bool(l), FieldValue::Bool(r)) => (*l as i32) - (*r as i32),

        // Mixed types: number < text < boolean
        (FieldValue::Number(_), FieldValue::Text(_)) => -1,
        (FieldValue::Text(_), FieldValue::Number(_)) => 1,
        (FieldValue::Number(_), FieldValue::Bool(_)) => -1,
        (FieldValue::Bool(_), FieldValue::Number(_)) => 1,
        (FieldValue::Text(_), FieldValue::Bool(_)) => -1,
        (FieldValue::Bool(_), FieldValue::Text(_)) => 1,

        _ => 0,
    }
}

/// Evaluate a unary operation
fn evaluate_unary_op(
    op: UnaryOperator,
    operand: &FormulaExpr,
    ctx: &EvaluationContext,
) -> FormulaResult<FieldValue> {
    let val = evaluate(operand, ctx)?;

    match op {
        UnaryOperator::Negate => Ok(FieldValue::Number(-to_number(&val)?)),
        UnaryOperator::Not => Ok(FieldValue::Bool(!to_bool(&val)?)),
    }
}

/// Evaluate a function call
fn evaluate_function(
    name: &str,
    args: &[FormulaExpr],
    ctx: &EvaluationContext,
) -> FormulaResult<FieldValue> {
    let registry = get_function_registry();

    let func = registry
        .get(name)
        .ok_or_else(|| FormulaError::UnknownFunction(name.to_string()))?;

    // Check argument count
    if args.len() < func.min_args {
        return Err(FormulaError::ArgumentCount {
            function: name.to_string(),
            expected: format!("at least {}", func.min_args),
            actual: args.len(),
        });
    }

    if let Some(max) = func.max_args {
        if args.len() > max {
            return Err(FormulaError::ArgumentCount {
                function: name.to_string(),
                expected: format!("at most {}", max),
                actual: args.len(),
            });
        }
    }

    // Evaluate arguments
    let mut evaluated_args = Vec::with_capacity(args.len());
    for arg in args {
        evaluated_args.push(evaluate(arg, ctx)?);
    }

    // Call the function
    (func.implementation)(&evaluated_args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_formula;

    fn eval(formula: &str) -> FormulaResult<FieldValue> {
        let ast = parse_formula(formula)?;
        let ctx = EvaluationContext::new();
        evaluate(&ast, &ctx)
    }

    fn eval_with(formula: &str, ctx: &EvaluationContext) -> FormulaResult<FieldValue> {
        let ast = parse_formula(formula)?;
        evaluate(&ast, ctx)
    }

    #[test]
    fn test_evaluate_literals() {
        assert_eq!(eval("42").unwrap(), FieldValue::Number(42.0));
        assert_eq!(eval("\"hi\"").unwrap(), FieldValue::Text("hi".into()));
        assert_eq!(eval("true").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("null").unwrap(), FieldValue::Null);
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2").unwrap(), FieldValue::Number(3.0));
        assert_eq!(eval("10-3").unwrap(), FieldValue::Number(7.0));
        assert_eq!(eval("4*5").unwrap(), FieldValue::Number(20.0));
        assert_eq!(eval("20/4").unwrap(), FieldValue::Number(5.0));
        assert_eq!(eval("7%3").unwrap(), FieldValue::Number(1.0));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("1+2*3").unwrap(), FieldValue::Number(7.0));
        assert_eq!(eval("(1+2)*3").unwrap(), FieldValue::Number(9.0));
        assert_eq!(eval("2+3*4-5").unwrap(), FieldValue::Number(9.0));
    }

    #[test]
    fn test_evaluate_unary() {
        assert_eq!(eval("-5").unwrap(), FieldValue::Number(-5.0));
        assert_eq!(eval("--5").unwrap(), FieldValue::Number(5.0));
        assert_eq!(eval("!true").unwrap(), FieldValue::Bool(false));
        assert_eq!(eval("!false").unwrap(), FieldValue::Bool(true));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("1<2").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("1>2").unwrap(), FieldValue::Bool(false));
        assert_eq!(eval("5==5").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("5!=5").unwrap(), FieldValue::Bool(false));
        assert_eq!(eval("5<=5").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("5>=6").unwrap(), FieldValue::Bool(false));
        assert_eq!(eval("\"a\" == \"A\"").unwrap(), FieldValue::Bool(true));
    }

    #[test]
    fn test_evaluate_boolean_logic() {
        assert_eq!(eval("true && true").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("true && false").unwrap(), FieldValue::Bool(false));
        assert_eq!(eval("false || true").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("false || false").unwrap(), FieldValue::Bool(false));
        // Numbers coerce to booleans
        assert_eq!(eval("1 && 2").unwrap(), FieldValue::Bool(true));
        assert_eq!(eval("0 || 0").unwrap(), FieldValue::Bool(false));
    }

    #[test]
    fn test_short_circuit() {
        // The right side would be a type error, but is never evaluated
        assert_eq!(
            eval("false && \"x\" / 2 > 0").unwrap(),
            FieldValue::Bool(false)
        );
        assert_eq!(
            eval("true || \"x\" / 2 > 0").unwrap(),
            FieldValue::Bool(true)
        );
    }

    #[test]
    fn test_evaluate_text_concat() {
        assert_eq!(
            eval("\"Total: \" + 42").unwrap(),
            FieldValue::Text("Total: 42".into())
        );
        assert_eq!(
            eval("\"a\" + \"b\"").unwrap(),
            FieldValue::Text("ab".into())
        );
    }

    #[test]
    fn test_evaluate_null_arithmetic() {
        // Null coerces to 0 in arithmetic
        assert_eq!(eval("null + 5").unwrap(), FieldValue::Number(5.0));
        assert_eq!(eval("null == 0").unwrap(), FieldValue::Bool(true));
    }

    #[test]
    fn test_division_by_zero() {
        assert!(matches!(eval("1/0"), Err(FormulaError::DivisionByZero)));
        assert!(matches!(eval("1%0"), Err(FormulaError::DivisionByZero)));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            eval("\"abc\" * 2"),
            Err(FormulaError::TypeMismatch { .. })
        ));
        assert!(matches!(
            eval("!\"abc\""),
            Err(FormulaError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_unknown_identifier() {
        let err = eval("qty * 2").unwrap_err();
        assert!(matches!(err, FormulaError::UnknownIdentifier(name) if name == "qty"));
    }

    #[test]
    fn test_unknown_function() {
        assert!(matches!(
            eval("NOPE(1)"),
            Err(FormulaError::UnknownFunction(_))
        ));
    }

    #[test]
    fn test_argument_count() {
        assert!(matches!(
            eval("ABS(1, 2)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
        assert!(matches!(
            eval("IF(true)"),
            Err(FormulaError::ArgumentCount { .. })
        ));
    }

    #[test]
    fn test_evaluate_with_fields() {
        let ctx = EvaluationContext::new()
            .with_value("qty", 3.0)
            .with_value("price", 10.0);

        assert_eq!(
            eval_with("qty * price", &ctx).unwrap(),
            FieldValue::Number(30.0)
        );
        assert_eq!(
            eval_with("IF(qty > 2, \"bulk\", \"single\")", &ctx).unwrap(),
            FieldValue::Text("bulk".into())
        );
    }

    #[test]
    fn test_evaluate_functions() {
        assert_eq!(eval("SUM(1,2,3)").unwrap(), FieldValue::Number(6.0));
        assert_eq!(eval("AVG(2,4,6)").unwrap(), FieldValue::Number(4.0));
        assert_eq!(eval("MIN(5,2,8)").unwrap(), FieldValue::Number(2.0));
        assert_eq!(eval("MAX(5,2,8)").unwrap(), FieldValue::Number(8.0));
        assert_eq!(eval("COUNT(1,\"a\",2)").unwrap(), FieldValue::Number(2.0));
        assert_eq!(eval("ROUND(2.5)").unwrap(), FieldValue::Number(3.0));
        assert_eq!(eval("ABS(-5)").unwrap(), FieldValue::Number(5.0));
    }

    #[test]
    fn test_evaluate_nested_functions() {
        assert_eq!(
            eval("SUM(1, IF(true, 10, 20), 3)").unwrap(),
            FieldValue::Number(14.0)
        );
        assert_eq!(
            eval("ROUND(AVG(1, 2), 0)").unwrap(),
            FieldValue::Number(2.0)
        );
    }
}
