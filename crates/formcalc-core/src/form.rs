//! Live value access
//!
//! The engine never touches rendered controls directly. It reads and writes
//! field values through [`FieldBinding`], which the surrounding form
//! controller implements on top of whatever widget layer it uses.
//! [`FormState`] is the plain in-memory implementation used in tests and
//! headless evaluation.

use crate::value::FieldValue;
use ahash::AHashMap;

/// Get/set contract between the engine and the rendered form
pub trait FieldBinding {
    /// Read the current value of a field
    ///
    /// Unknown fields read as [`FieldValue::Null`].
    fn value(&self, name: &str) -> FieldValue;

    /// Write a computed value into a field's control
    fn set_value(&mut self, name: &str, value: FieldValue);
}

/// In-memory field values keyed by name
#[derive(Debug, Default, Clone)]
pub struct FormState {
    values: AHashMap<String, FieldValue>,
}

impl FormState {
    /// Create an empty form state
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, for test setup
    pub fn with<S: Into<String>, V: Into<FieldValue>>(mut self, name: S, value: V) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Number of fields holding a value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no field holds a value
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl FieldBinding for FormState {
    fn value(&self, name: &str) -> FieldValue {
        self.values.get(name).cloned().unwrap_or(FieldValue::Null)
    }

    fn set_value(&mut self, name: &str, value: FieldValue) {
        self.values.insert(name.to_string(), value);
    }
}
