//! # formcalc-formula
//!
//! Formula parser, evaluator and dependency engine for formcalc.
//!
//! This crate provides:
//! - Formula parsing (text → AST)
//! - Formula evaluation (AST → value)
//! - The fixed function vocabulary (IF, SUM, AVG, MIN, MAX, COUNT, ROUND, ABS)
//! - Dependency tracking and change propagation for calculated fields
//!
//! ## Example
//!
//! ```rust
//! use formcalc_core::{FieldBinding, FieldDescriptor, FieldKind, FieldValue, FormState};
//! use formcalc_formula::FormulaEngine;
//!
//! let engine = FormulaEngine::from_descriptors(&[
//!     FieldDescriptor::input("qty", FieldKind::Number),
//!     FieldDescriptor::input("price", FieldKind::Number),
//!     FieldDescriptor::calculated("total", FieldKind::Number, "qty * price"),
//! ])?;
//!
//! let mut state = FormState::new().with("qty", 3.0).with("price", 10.0);
//! engine.initialize_all(&mut state);
//! assert_eq!(state.value("total"), FieldValue::Number(30.0));
//!
//! state.set_value("qty", 5.0.into());
//! engine.on_field_changed("qty", &mut state);
//! assert_eq!(state.value("total"), FieldValue::Number(50.0));
//! # Ok::<(), formcalc_formula::FormulaError>(())
//! ```

pub mod ast;
pub mod dependency;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;

pub use ast::{BinaryOperator, FormulaExpr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use engine::{CalcStats, FormulaEngine};
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{evaluate, EvaluationContext};
pub use parser::parse_formula;
