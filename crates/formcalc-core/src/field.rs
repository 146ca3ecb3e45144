//! Field descriptors
//!
//! A form is defined by a flat list of [`FieldDescriptor`]s delivered by the
//! backend. The descriptor carries everything the engine needs: the unique
//! field name, the rendered control kind, and - for calculated fields - the
//! formula text.

use crate::error::{Error, Result};
use crate::MAX_FIELD_NAME_LEN;

/// The kind of control a field renders as
///
/// The engine only cares about the coercion class: `Checkbox` reads as a
/// boolean, `Number` reads as numeric-or-zero, everything else reads as raw
/// text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "lowercase")
)]
pub enum FieldKind {
    /// Single-line text input
    #[default]
    Text,
    /// Numeric input
    Number,
    /// Checkbox
    Checkbox,
    /// Dropdown selection
    Select,
    /// Date picker (value handled as text by the engine)
    Date,
    /// Multi-line text input
    Textarea,
}

/// Describes one form field
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    /// Unique name within the form
    pub name: String,

    /// Rendered control kind
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: FieldKind,

    /// Whether the field derives its value from a formula
    #[cfg_attr(feature = "serde", serde(default, rename = "isCalculated"))]
    pub calculated: bool,

    /// Formula text; required when `calculated` is set
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub formula: Option<String>,
}

impl FieldDescriptor {
    /// Create a plain input field
    pub fn input<S: Into<String>>(name: S, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            calculated: false,
            formula: None,
        }
    }

    /// Create a calculated field with a formula
    pub fn calculated<S: Into<String>, F: Into<String>>(
        name: S,
        kind: FieldKind,
        formula: F,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            calculated: true,
            formula: Some(formula.into()),
        }
    }

    /// Validate the descriptor
    ///
    /// Names must be non-empty identifiers (so formulas can reference them),
    /// and calculated fields must carry a formula.
    pub fn validate(&self) -> Result<()> {
        if !is_valid_field_name(&self.name) {
            return Err(Error::InvalidFieldName(self.name.clone()));
        }
        if self.name.len() > MAX_FIELD_NAME_LEN {
            return Err(Error::FieldNameTooLong(
                self.name.clone(),
                self.name.len(),
                MAX_FIELD_NAME_LEN,
            ));
        }
        if self.calculated && self.formula.is_none() {
            return Err(Error::MissingFormula(self.name.clone()));
        }
        Ok(())
    }
}

/// Check that a name is a formula-addressable identifier:
/// `[A-Za-z_][A-Za-z0-9_]*`
pub fn is_valid_field_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
