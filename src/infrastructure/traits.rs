//! Boundary traits for testability
//!
//! The type-hierarchy lookup belongs to the host content system; rules only see
//! this trait, so tests can hand in a plain map.

use std::collections::HashMap;

/// Resolves the parent of a structural type tag.
pub trait TypeResolver: Send + Sync {
    /// The next more general type tag, or None at the end of the chain.
    fn parent_type_of(&self, type_tag: &str) -> Option<String>;
}

/// Map-backed type hierarchy (`type tag -> parent type tag`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeHierarchy {
    parents: HashMap<String, String>,
}

impl TypeHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(mut self, type_tag: impl Into<String>, parent: impl Into<String>) -> Self {
        self.insert(type_tag, parent);
        self
    }

    pub fn insert(&mut self, type_tag: impl Into<String>, parent: impl Into<String>) {
        self.parents.insert(type_tag.into(), parent.into());
    }

    pub fn len(&self) -> usize {
        self.parents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parents.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TypeHierarchy {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            parents: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl TypeResolver for TypeHierarchy {
    fn parent_type_of(&self, type_tag: &str) -> Option<String> {
        self.parents
            .get(type_tag)
            .filter(|parent| !parent.is_empty())
            .cloned()
    }
}

/// Whether `type_tag` or any type up its chain equals `target`.
///
/// Stops on a repeated tag so a cyclic hierarchy cannot loop forever.
pub fn type_chain_contains(resolver: &dyn TypeResolver, type_tag: &str, target: &str) -> bool {
    let mut seen = Vec::new();
    let mut current = Some(type_tag.to_string());
    while let Some(tag) = current {
        if tag.is_empty() || seen.contains(&tag) {
            return false;
        }
        if tag == target {
            return true;
        }
        current = resolver.parent_type_of(&tag);
        seen.push(tag);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_chain_when_resolving_then_walks_to_ancestor() {
        let hierarchy = TypeHierarchy::new()
            .with_parent("my/grid", "my/base")
            .with_parent("my/base", "wcm/grid");
        assert!(type_chain_contains(&hierarchy, "my/grid", "wcm/grid"));
        assert!(type_chain_contains(&hierarchy, "wcm/grid", "wcm/grid"));
        assert!(!type_chain_contains(&hierarchy, "my/grid", "other"));
    }

    #[test]
    fn given_cycle_when_resolving_then_terminates() {
        let hierarchy: TypeHierarchy = [("a", "b"), ("b", "a")].into_iter().collect();
        assert!(!type_chain_contains(&hierarchy, "a", "c"));
    }
}
