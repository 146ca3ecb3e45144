//! # formcalc-core
//!
//! Core data structures for the formcalc calculated-field engine.
//!
//! This crate provides the fundamental types used throughout formcalc:
//! - [`FieldValue`] - Represents field values (numbers, text, booleans, null)
//! - [`FieldDescriptor`] and [`FieldKind`] - How a form describes its fields
//! - [`FieldBinding`] - The get/set contract between the engine and rendered controls
//! - [`FormState`] - An in-memory [`FieldBinding`] for tests and headless use
//!
//! ## Example
//!
//! ```rust
//! use formcalc_core::{FieldBinding, FieldValue, FormState};
//!
//! let mut state = FormState::new();
//! state.set_value("qty", 3.0.into());
//! state.set_value("note", "draft".into());
//!
//! assert_eq!(state.value("qty"), FieldValue::Number(3.0));
//! assert_eq!(state.value("missing"), FieldValue::Null);
//! ```

pub mod error;
pub mod field;
pub mod form;
pub mod value;

// Re-exports for convenience
pub use error::{Error, Result};
pub use field::{FieldDescriptor, FieldKind};
pub use form::{FieldBinding, FormState};
pub use value::FieldValue;

/// Maximum length of a field name accepted from a descriptor list
pub const MAX_FIELD_NAME_LEN: usize = 128;
