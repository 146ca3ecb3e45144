//! Field value types

use std::fmt;

/// Represents the current value of a form field
///
/// Form controls only ever hold one of four shapes: nothing, a boolean
/// (checkbox), a number, or text. All numbers are stored as f64.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// No value (untouched input, cleared control)
    #[default]
    Null,

    /// Boolean value (checkbox state)
    Bool(bool),

    /// Numeric value
    Number(f64),

    /// Text value
    Text(String),
}

impl FieldValue {
    /// Check if the value is null
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Try to interpret the value as a number
    ///
    /// Booleans coerce to 0/1, null to 0, and text is parsed.
    /// Non-numeric text yields `None`.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Bool(true) => Some(1.0),
            FieldValue::Bool(false) => Some(0.0),
            FieldValue::Text(s) => s.trim().parse().ok(),
            FieldValue::Null => Some(0.0),
        }
    }

    /// Try to interpret the value as a boolean
    ///
    /// Numbers coerce to `n != 0`, null to false, and the literal strings
    /// "true"/"false" (any case) are recognized. Other text yields `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            FieldValue::Number(n) => Some(*n != 0.0),
            FieldValue::Null => Some(false),
            FieldValue::Text(s) => {
                if s.eq_ignore_ascii_case("true") {
                    Some(true)
                } else if s.eq_ignore_ascii_case("false") {
                    Some(false)
                } else {
                    None
                }
            }
        }
    }

    /// Render the value the way a text control would display it
    pub fn to_display_string(&self) -> String {
        match self {
            FieldValue::Null => String::new(),
            FieldValue::Bool(true) => "true".to_string(),
            FieldValue::Bool(false) => "false".to_string(),
            FieldValue::Number(n) => {
                // Integers render without a trailing ".0"
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    format!("{}", n)
                }
            }
            FieldValue::Text(s) => s.clone(),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(FieldValue::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_as_number_coercions() {
        assert_eq!(FieldValue::Number(2.5).as_number(), Some(2.5));
        assert_eq!(FieldValue::Bool(true).as_number(), Some(1.0));
        assert_eq!(FieldValue::Bool(false).as_number(), Some(0.0));
        assert_eq!(FieldValue::Null.as_number(), Some(0.0));
        assert_eq!(FieldValue::Text(" 42 ".into()).as_number(), Some(42.0));
        assert_eq!(FieldValue::Text("abc".into()).as_number(), None);
    }

    #[test]
    fn test_as_bool_coercions() {
        assert_eq!(FieldValue::Bool(true).as_bool(), Some(true));
        assert_eq!(FieldValue::Number(0.0).as_bool(), Some(false));
        assert_eq!(FieldValue::Number(-1.0).as_bool(), Some(true));
        assert_eq!(FieldValue::Null.as_bool(), Some(false));
        assert_eq!(FieldValue::Text("TRUE".into()).as_bool(), Some(true));
        assert_eq!(FieldValue::Text("nope".into()).as_bool(), None);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(FieldValue::Number(3.0).to_display_string(), "3");
        assert_eq!(FieldValue::Number(3.25).to_display_string(), "3.25");
        assert_eq!(FieldValue::Bool(true).to_display_string(), "true");
        assert_eq!(FieldValue::Null.to_display_string(), "");
        assert_eq!(FieldValue::Text("hi".into()).to_display_string(), "hi");
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(FieldValue::from(1.5), FieldValue::Number(1.5));
        assert_eq!(FieldValue::from(true), FieldValue::Bool(true));
        assert_eq!(FieldValue::from("x"), FieldValue::Text("x".into()));
        assert_eq!(FieldValue::from(None::<f64>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(2.0)), FieldValue::Number(2.0));
    }
}
