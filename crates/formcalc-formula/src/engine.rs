//! The calculated-field engine
//!
//! One [`FormulaEngine`] instance is built per rendered form and dropped with
//! it. It owns the field registry, the compiled formulas and the dependency
//! graph, and drives recalculation when the form controller reports a field
//! change.
//!
//! Evaluation failures are deliberately non-fatal: a calculated field that
//! fails to compute keeps its previous value and the failure is only logged.
//! Registration failures (parse errors, cycles, unknown fields) are returned
//! as errors because they indicate a broken form definition.

use crate::ast::FormulaExpr;
use crate::dependency::DependencyGraph;
use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::{evaluate, EvaluationContext};
use crate::parser::parse_formula;
use ahash::AHashMap;
use formcalc_core::{Error as FieldError, FieldBinding, FieldDescriptor, FieldKind, FieldValue};

/// Reserved words that never resolve to a field, even if a field shares the
/// name. Compared case-insensitively.
const RESERVED_WORDS: &[&str] = &[
    "IF", "SUM", "AVG", "MIN", "MAX", "COUNT", "ROUND", "ABS", "TRUE", "FALSE", "NULL",
];

fn is_reserved_word(name: &str) -> bool {
    RESERVED_WORDS
        .iter()
        .any(|w| w.eq_ignore_ascii_case(name))
}

/// A registered formula with its compiled form
#[derive(Debug)]
struct CompiledFormula {
    /// Original formula text
    source: String,
    /// Parsed AST
    ast: FormulaExpr,
    /// Registered fields the formula references
    refs: Vec<String>,
}

/// Statistics from an [`FormulaEngine::initialize_all`] pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CalcStats {
    /// Number of calculated fields evaluated
    pub fields_evaluated: usize,
    /// Number of fields whose value was written back
    pub fields_written: usize,
    /// Number of evaluation failures (logged, not raised)
    pub errors: usize,
}

/// Owns calculated-field registration, dependency tracking and propagation
/// for one form
#[derive(Debug, Default)]
pub struct FormulaEngine {
    /// Every known field and its control kind
    fields: AHashMap<String, FieldKind>,
    /// Formula per calculated field
    formulas: AHashMap<String, CompiledFormula>,
    /// Upstream → downstream edges derived from the formulas
    graph: DependencyGraph,
    /// Calculated fields in registration order, for the initial fill
    calc_order: Vec<String>,
}

impl FormulaEngine {
    /// Create an empty engine
    ///
    /// When building incrementally, add every plain field with
    /// [`add_field`](Self::add_field) before registering formulas that
    /// reference it: dependency edges are extracted against the fields known
    /// at registration time. [`from_descriptors`](Self::from_descriptors)
    /// enforces that ordering and is the preferred entry point.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an engine from a complete descriptor list
    ///
    /// All field names are registered before any formula, so edge extraction
    /// never depends on descriptor order.
    pub fn from_descriptors(descriptors: &[FieldDescriptor]) -> FormulaResult<Self> {
        let mut engine = Self::new();

        for desc in descriptors {
            desc.validate()?;
            engine.add_field(&desc.name, desc.kind)?;
        }

        for desc in descriptors {
            if let Some(formula) = &desc.formula {
                engine.register(&desc.name, formula)?;
            }
        }

        Ok(engine)
    }

    /// Register a field name and its control kind
    pub fn add_field(&mut self, name: &str, kind: FieldKind) -> FormulaResult<()> {
        if name.is_empty() {
            return Err(FieldError::InvalidFieldName(name.to_string()).into());
        }
        if self.fields.contains_key(name) {
            return Err(FieldError::DuplicateField(name.to_string()).into());
        }
        self.fields.insert(name.to_string(), kind);
        Ok(())
    }

    /// Register (or replace) the formula for a calculated field
    ///
    /// Parses the formula, extracts its field references, and wires the
    /// dependency edges. Identifiers that match no registered field are
    /// ignored; reserved words never become references. Registration is
    /// idempotent: replacing a formula first drops the old edges, so a field
    /// recalculates exactly once per upstream change regardless of how often
    /// it was registered. A formula that would close a dependency cycle is
    /// rejected outright and the graph is left untouched.
    pub fn register(&mut self, name: &str, formula_text: &str) -> FormulaResult<()> {
        if !self.fields.contains_key(name) {
            return Err(FieldError::UnknownField(name.to_string()).into());
        }

        let ast = parse_formula(formula_text)?;

        let mut refs = collect_field_refs(&ast);
        refs.retain(|r| !is_reserved_word(r) && self.fields.contains_key(r));

        // Fail fast on cycles before touching the graph: a cycle closes if
        // this field references itself or anything that already depends on it.
        for r in &refs {
            if r == name || self.graph.depends_on(r, name) {
                return Err(FormulaError::CircularDependency(name.to_string()));
            }
        }

        // Replace any previous registration
        if self.formulas.remove(name).is_some() {
            self.graph.clear_dependencies(name);
        } else {
            self.calc_order.push(name.to_string());
        }

        for r in &refs {
            self.graph.add_dependency(r, name);
        }

        self.formulas.insert(
            name.to_string(),
            CompiledFormula {
                source: formula_text.to_string(),
                ast,
                refs,
            },
        );

        Ok(())
    }

    /// Whether a field has a registered formula
    pub fn is_calculated(&self, name: &str) -> bool {
        self.formulas.contains_key(name)
    }

    /// The registered formula text for a field, if any
    pub fn formula_text(&self, name: &str) -> Option<&str> {
        self.formulas.get(name).map(|f| f.source.as_str())
    }

    /// Fields a calculated field's formula references, in the order they
    /// first appear in the formula
    pub fn precedents(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        self.formulas
            .get(name)
            .into_iter()
            .flat_map(|f| f.refs.iter().map(String::as_str))
    }

    /// Calculated fields directly referencing the given field
    pub fn dependents(&self, name: &str) -> impl Iterator<Item = &str> + '_ {
        self.graph.dependents(name)
    }

    /// Number of registered fields
    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Evaluate a formula against the current field values
    ///
    /// Returns `None` on any failure (parse error, unknown identifier, type
    /// mismatch, division by zero); the failure is logged and never escalated.
    pub fn evaluate(&self, formula_text: &str, binding: &dyn FieldBinding) -> Option<FieldValue> {
        let ctx = self.snapshot(binding);
        match parse_formula(formula_text).and_then(|ast| evaluate(&ast, &ctx)) {
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("formula '{}' failed: {}", formula_text, e);
                None
            }
        }
    }

    /// React to a field value change reported by the form controller
    ///
    /// Every calculated field downstream of `name` is recalculated exactly
    /// once, dependencies first, and non-null results are written back
    /// through the binding. The cascade runs to completion before returning.
    pub fn on_field_changed(&self, name: &str, binding: &mut dyn FieldBinding) {
        let order = self.graph.downstream_order(name);
        if order.is_empty() {
            return;
        }

        let mut ctx = self.snapshot(binding);

        for field in &order {
            let Some(compiled) = self.formulas.get(field) else {
                continue;
            };

            match evaluate(&compiled.ast, &ctx) {
                Ok(FieldValue::Null) => {}
                Ok(value) => {
                    // Later evaluations in the cascade see the new value
                    ctx.insert(field.clone(), value.clone());
                    binding.set_value(field, value);
                }
                Err(e) => {
                    log::warn!("recalculation of '{}' failed: {}", field, e);
                }
            }
        }
    }

    /// Evaluate every calculated field once, in registration order
    ///
    /// This is the initial fill after the form renders: results are written
    /// back, but no change cascades are raised beyond the single pass itself.
    pub fn initialize_all(&self, binding: &mut dyn FieldBinding) -> CalcStats {
        let mut stats = CalcStats::default();
        let mut ctx = self.snapshot(binding);

        for field in &self.calc_order {
            let Some(compiled) = self.formulas.get(field) else {
                continue;
            };
            stats.fields_evaluated += 1;

            match evaluate(&compiled.ast, &ctx) {
                Ok(FieldValue::Null) => {}
                Ok(value) => {
                    ctx.insert(field.clone(), value.clone());
                    binding.set_value(field, value);
                    stats.fields_written += 1;
                }
                Err(e) => {
                    log::warn!("initial evaluation of '{}' failed: {}", field, e);
                    stats.errors += 1;
                }
            }
        }

        stats
    }

    /// Snapshot every registered field's current value, coerced by kind:
    /// checkboxes read as booleans, number inputs as numeric-or-zero,
    /// everything else as raw text.
    fn snapshot(&self, binding: &dyn FieldBinding) -> EvaluationContext {
        let mut ctx = EvaluationContext::new();

        for (name, kind) in &self.fields {
            let raw = binding.value(name);
            let coerced = match kind {
                FieldKind::Checkbox => FieldValue::Bool(raw.as_bool().unwrap_or(false)),
                FieldKind::Number => FieldValue::Number(raw.as_number().unwrap_or(0.0)),
                _ => match raw {
                    FieldValue::Null => FieldValue::Null,
                    other => FieldValue::Text(other.to_display_string()),
                },
            };
            ctx.insert(name.clone(), coerced);
        }

        ctx
    }
}

/// Extract the set of field names referenced by a formula AST
///
/// Returns each name once, in first-appearance order.
fn collect_field_refs(expr: &FormulaExpr) -> Vec<String> {
    let mut refs = Vec::new();
    collect_field_refs_recursive(expr, &mut refs);
    refs
}

fn collect_field_refs_recursive(expr: &FormulaExpr, refs: &mut Vec<String>) {
    match expr {
        FormulaExpr::FieldRef(name) => {
            if !refs.iter().any(|r| r == name) {
                refs.push(name.clone());
            }
        }
        FormulaExpr::BinaryOp { left, right, .. } => {
            collect_field_refs_recursive(left, refs);
            collect_field_refs_recursive(right, refs);
        }
        FormulaExpr::UnaryOp { operand, .. } => {
            collect_field_refs_recursive(operand, refs);
        }
        FormulaExpr::Function { args, .. } => {
            for arg in args {
                collect_field_refs_recursive(arg, refs);
            }
        }
        // Literals have no references
        FormulaExpr::Number(_) | FormulaExpr::Text(_) | FormulaExpr::Bool(_) | FormulaExpr::Null => {
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formcalc_core::FormState;

    fn number_field(name: &str) -> FieldDescriptor {
        FieldDescriptor::input(name, FieldKind::Number)
    }

    #[test]
    fn test_collect_field_refs() {
        let ast = parse_formula("IF(qty > 10, SUM(a, b), AVG(a, b))").unwrap();
        let refs = collect_field_refs(&ast);
        assert_eq!(refs, vec!["qty", "a", "b"]);
    }

    #[test]
    fn test_register_ignores_unknown_and_reserved_identifiers() {
        let mut engine = FormulaEngine::new();
        engine.add_field("a", FieldKind::Number).unwrap();
        engine.add_field("t", FieldKind::Number).unwrap();
        engine.register("t", "a + ghost + SUM(a)").unwrap();

        let precedents: Vec<_> = engine.precedents("t").collect();
        assert_eq!(precedents, vec!["a"]);
    }

    #[test]
    fn test_register_unknown_field_fails() {
        let mut engine = FormulaEngine::new();
        assert!(matches!(
            engine.register("nope", "1 + 1"),
            Err(FormulaError::Field(FieldError::UnknownField(_)))
        ));
    }

    #[test]
    fn test_register_parse_error_fails() {
        let mut engine = FormulaEngine::new();
        engine.add_field("t", FieldKind::Number).unwrap();
        assert!(matches!(
            engine.register("t", "1 +"),
            Err(FormulaError::Parse(_))
        ));
    }

    #[test]
    fn test_register_rejects_self_reference() {
        let mut engine = FormulaEngine::new();
        engine.add_field("x", FieldKind::Number).unwrap();
        assert!(matches!(
            engine.register("x", "x + 1"),
            Err(FormulaError::CircularDependency(_))
        ));
        // The failed registration left nothing behind
        assert!(!engine.is_calculated("x"));
    }

    #[test]
    fn test_register_rejects_cycle() {
        let mut engine = FormulaEngine::new();
        engine.add_field("a", FieldKind::Number).unwrap();
        engine.add_field("b", FieldKind::Number).unwrap();

        engine.register("a", "b + 1").unwrap();
        assert!(matches!(
            engine.register("b", "a * 2"),
            Err(FormulaError::CircularDependency(_))
        ));
        // 'b' never became calculated, and 'a' is untouched
        assert!(!engine.is_calculated("b"));
        assert!(engine.is_calculated("a"));
    }

    #[test]
    fn test_reregistration_replaces_edges() {
        let mut engine = FormulaEngine::new();
        engine.add_field("a", FieldKind::Number).unwrap();
        engine.add_field("b", FieldKind::Number).unwrap();
        engine.add_field("t", FieldKind::Number).unwrap();

        engine.register("t", "a + b").unwrap();
        engine.register("t", "a * 2").unwrap();

        let precedents: Vec<_> = engine.precedents("t").collect();
        assert_eq!(precedents, vec!["a"]);
        assert_eq!(engine.formula_text("t"), Some("a * 2"));
        // 'b' no longer triggers 't'
        assert_eq!(engine.dependents("b").count(), 0);
    }

    #[test]
    fn test_snapshot_kind_coercion() {
        let engine = FormulaEngine::from_descriptors(&[
            FieldDescriptor::input("active", FieldKind::Checkbox),
            FieldDescriptor::input("qty", FieldKind::Number),
            FieldDescriptor::input("note", FieldKind::Text),
        ])
        .unwrap();

        let mut state = FormState::new()
            .with("active", 1.0)
            .with("qty", "not a number")
            .with("note", "hello");

        // Checkbox reads as bool, number-or-zero, text as raw string
        assert_eq!(
            engine.evaluate("active", &state),
            Some(FieldValue::Bool(true))
        );
        assert_eq!(engine.evaluate("qty", &state), Some(FieldValue::Number(0.0)));
        assert_eq!(
            engine.evaluate("note", &state),
            Some(FieldValue::Text("hello".into()))
        );

        state.set_value("active", FieldValue::Null);
        assert_eq!(
            engine.evaluate("active", &state),
            Some(FieldValue::Bool(false))
        );
    }

    #[test]
    fn test_evaluate_swallows_failures() {
        let engine = FormulaEngine::from_descriptors(&[number_field("qty")]).unwrap();
        let state = FormState::new().with("qty", 1.0);

        assert_eq!(engine.evaluate("qty /", &state), None);
        assert_eq!(engine.evaluate("qty / 0", &state), None);
        assert_eq!(engine.evaluate("ghost + 1", &state), None);
        // Malformed formulas with a trailing token yield no value
        assert_eq!(engine.evaluate("qty qty", &state), None);
    }

    #[test]
    fn test_from_descriptors_order_independent() {
        // The calculated field is declared before the inputs it references
        let engine = FormulaEngine::from_descriptors(&[
            FieldDescriptor::calculated("total", FieldKind::Number, "qty * price"),
            number_field("qty"),
            number_field("price"),
        ])
        .unwrap();

        // Precedents come back in formula appearance order
        let precedents: Vec<_> = engine.precedents("total").collect();
        assert_eq!(precedents, vec!["qty", "price"]);
    }

    #[test]
    fn test_from_descriptors_validates() {
        let mut bad = FieldDescriptor::input("t", FieldKind::Number);
        bad.calculated = true;
        assert!(matches!(
            FormulaEngine::from_descriptors(&[bad]),
            Err(FormulaError::Field(FieldError::MissingFormula(_)))
        ));

        assert!(matches!(
            FormulaEngine::from_descriptors(&[number_field("a"), number_field("a")]),
            Err(FormulaError::Field(FieldError::DuplicateField(_)))
        ));
    }
}
