//! Definition registry.
//!
//! Every node that becomes a standalone definition is registered under its
//! canonical key together with its source description. One key must mean
//! one thing: when a key collects more than one distinct description across
//! a run, it is a [`Collision`] and its output is discarded by the caller.
//!
//! The registry is an owned collector: one run creates it empty, threads it
//! through the builder as `&mut`, and consumes it with
//! [`DefinitionRegistry::collisions`] at the end.

use std::collections::{BTreeMap, BTreeSet};

use tabular_schema_core::RecordPath;

use crate::report::Collision;

#[derive(Debug, Clone, Default)]
struct Entry {
    descriptions: BTreeSet<Option<String>>,
    paths: Vec<String>,
}

/// Accumulator of `key -> distinct descriptions` for one conversion run.
///
/// # Examples
///
/// ```
/// use tabular_schema_core::RecordPath;
/// use tabular_schema_convert::registry::DefinitionRegistry;
///
/// let mut registry = DefinitionRegistry::new();
/// registry.register("OBAccount1", &RecordPath::parse("A/Account"), Some("An account."));
/// registry.register("OBAccount1", &RecordPath::parse("B/Account"), Some("An account."));
/// assert!(registry.collisions().is_empty());
///
/// registry.register("OBAccount1", &RecordPath::parse("C/Account"), Some("Another meaning."));
/// let collisions = registry.collisions();
/// assert_eq!(collisions.len(), 1);
/// assert_eq!(collisions[0].descriptions.len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    entries: BTreeMap<String, Entry>,
}

impl DefinitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `path` defined `key` with `description`.
    pub fn register(&mut self, key: &str, path: &RecordPath, description: Option<&str>) {
        let entry = self.entries.entry(key.to_string()).or_default();
        entry.descriptions.insert(description.map(String::from));
        entry.paths.push(path.to_string());
    }

    /// Distinct descriptions recorded for `key`.
    pub fn descriptions(&self, key: &str) -> Option<Vec<Option<&str>>> {
        self.entries
            .get(key)
            .map(|entry| entry.descriptions.iter().map(Option::as_deref).collect())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of distinct keys registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Keys with more than one distinct description, in key order.
    pub fn collisions(&self) -> Vec<Collision> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.descriptions.len() > 1)
            .map(|(key, entry)| Collision {
                key: key.clone(),
                descriptions: entry.descriptions.iter().cloned().collect(),
                paths: entry.paths.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> RecordPath {
        RecordPath::parse(raw)
    }

    #[test]
    fn test_absent_description_is_distinct() {
        let mut registry = DefinitionRegistry::new();
        registry.register("K", &path("A/K"), None);
        registry.register("K", &path("B/K"), Some("text"));

        let collisions = registry.collisions();
        assert_eq!(collisions.len(), 1);
        assert_eq!(collisions[0].descriptions, vec![None, Some("text".to_string())]);
        assert_eq!(collisions[0].paths, ["A/K", "B/K"]);
    }

    #[test]
    fn test_collisions_are_sorted_by_key() {
        let mut registry = DefinitionRegistry::new();
        for key in ["Zeta", "Alpha"] {
            registry.register(key, &path("A"), Some("x"));
            registry.register(key, &path("B"), Some("y"));
        }
        let keys: Vec<String> = registry.collisions().into_iter().map(|c| c.key).collect();
        assert_eq!(keys, ["Alpha", "Zeta"]);
    }
}
