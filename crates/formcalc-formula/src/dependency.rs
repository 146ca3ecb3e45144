//! Dependency tracking between fields
//!
//! Edges run from an upstream field to the calculated fields whose formulas
//! reference it. The engine keeps the graph acyclic by probing with
//! [`DependencyGraph::depends_on`] before inserting edges, so traversals here
//! terminate without a runtime cycle guard.

use ahash::{AHashMap, AHashSet};

/// Dependency graph for calculated fields, keyed by field name
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Field → fields whose formulas reference it (dependents)
    dependents: AHashMap<String, AHashSet<String>>,
    /// Field → fields its formula references (precedents)
    precedents: AHashMap<String, AHashSet<String>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a dependency: `dependent`'s formula references `precedent`
    pub fn add_dependency(&mut self, precedent: &str, dependent: &str) {
        self.dependents
            .entry(precedent.to_string())
            .or_default()
            .insert(dependent.to_string());
        self.precedents
            .entry(dependent.to_string())
            .or_default()
            .insert(precedent.to_string());
    }

    /// Remove all edges into and out of a field's formula
    ///
    /// Called when a formula is replaced, so re-registration never leaves
    /// stale edges behind.
    pub fn clear_dependencies(&mut self, field: &str) {
        if let Some(precedents) = self.precedents.remove(field) {
            for precedent in precedents {
                if let Some(deps) = self.dependents.get_mut(&precedent) {
                    deps.remove(field);
                }
            }
        }
    }

    /// Fields whose formulas directly reference the given field
    pub fn dependents(&self, field: &str) -> impl Iterator<Item = &str> + '_ {
        self.dependents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Fields the given field's formula directly references
    pub fn precedents(&self, field: &str) -> impl Iterator<Item = &str> + '_ {
        self.precedents
            .get(field)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }

    /// Whether `field` depends on `target`, directly or transitively
    pub fn depends_on(&self, field: &str, target: &str) -> bool {
        let mut visited = AHashSet::new();
        self.depends_on_inner(field, target, &mut visited)
    }

    fn depends_on_inner<'a>(
        &'a self,
        field: &'a str,
        target: &str,
        visited: &mut AHashSet<&'a str>,
    ) -> bool {
        if !visited.insert(field) {
            return false;
        }
        if let Some(precedents) = self.precedents.get(field) {
            for precedent in precedents {
                if precedent == target || self.depends_on_inner(precedent, target, visited) {
                    return true;
                }
            }
        }
        false
    }

    /// All fields downstream of `changed`, ordered dependencies-first
    ///
    /// The changed field itself is not included. Each downstream field
    /// appears exactly once even when reachable along several paths, which is
    /// what keeps diamond-shaped graphs from recalculating a field twice.
    pub fn downstream_order(&self, changed: &str) -> Vec<String> {
        let mut post_order = Vec::new();
        let mut visited = AHashSet::new();

        self.visit(changed, &mut post_order, &mut visited);

        // Post-order DFS puts dependents before the fields they depend on;
        // reverse it and drop the root to get evaluation order.
        post_order.reverse();
        post_order.retain(|name| name != changed);
        post_order
    }

    fn visit<'a>(
        &'a self,
        field: &'a str,
        post_order: &mut Vec<String>,
        visited: &mut AHashSet<&'a str>,
    ) {
        if !visited.insert(field) {
            return;
        }

        if let Some(dependents) = self.dependents.get(field) {
            for dependent in dependents {
                self.visit(dependent, post_order, visited);
            }
        }

        post_order.push(field.to_string());
    }

    /// Clear the entire graph
    pub fn clear(&mut self) {
        self.dependents.clear();
        self.precedents.clear();
    }
}
