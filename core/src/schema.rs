//! Per-class option schema.
//!
//! A [`Schema`] is the ordered list of [`OptionSpec`]s a plugin class
//! accepts. It is built once while the class is declared. Subclasses start
//! from a [`snapshot`](Schema::snapshot_for_subclass) of their parent: the
//! spec objects are shared, the list is not, so later changes on either side
//! stay local.
//!
//! # Example
//!
//! ```
//! use plugin_config_core::{Kind, OptionSpec, Schema};
//!
//! let mut base = Schema::new();
//! base.declare(OptionSpec::new("path").validate(Kind::String).required());
//!
//! let mut child = base.snapshot_for_subclass();
//! child.declare(OptionSpec::new("mode").validate(Kind::String));
//! base.declare(OptionSpec::new("codec"));
//!
//! assert_eq!(child.names(), vec!["path", "mode"]);
//! assert_eq!(base.names(), vec!["path", "codec"]);
//! ```

use std::sync::Arc;

use crate::types::OptionSpec;

/// Ordered collection of option specs, unique per matcher.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    entries: Vec<Arc<OptionSpec>>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `spec`, overwriting an existing entry for the same matcher.
    ///
    /// Exact names collide by string equality; pattern matchers collide only
    /// with the same compiled pattern, so two patterns with equal source text
    /// are two entries.
    pub fn declare(&mut self, spec: OptionSpec) -> &mut Self {
        let spec = Arc::new(spec);
        match self
            .entries
            .iter_mut()
            .find(|existing| existing.matcher.same_entry(&spec.matcher))
        {
            Some(slot) => *slot = spec,
            None => self.entries.push(spec),
        }
        self
    }

    /// Shallow copy consumed when a subclass is created.
    pub fn snapshot_for_subclass(&self) -> Schema {
        self.clone()
    }

    /// Pulls in every entry of `parent` this schema does not already declare.
    ///
    /// Parent entries keep their relative order and come first; entries
    /// declared here win on collision.
    pub fn extend(&mut self, parent: &Schema) -> &mut Self {
        let mut merged: Vec<Arc<OptionSpec>> = parent
            .entries
            .iter()
            .filter(|p| !self.entries.iter().any(|own| own.matcher.same_entry(&p.matcher)))
            .cloned()
            .collect();
        merged.append(&mut self.entries);
        self.entries = merged;
        self
    }

    /// Entries in declaration order.
    pub fn entries(&self) -> impl Iterator<Item = &OptionSpec> {
        self.entries.iter().map(Arc::as_ref)
    }

    /// Entries in match order: exact matchers first, then patterns, each
    /// group in declaration order.
    pub fn ordered(&self) -> Vec<&OptionSpec> {
        let mut specs: Vec<&OptionSpec> = self.entries().collect();
        specs.sort_by_key(|spec| spec.matcher.sort_key());
        specs
    }

    /// First spec matching `key`; later matching specs are never consulted.
    pub fn find_match(&self, key: &str) -> Option<&OptionSpec> {
        self.ordered()
            .into_iter()
            .find(|spec| spec.matcher.matches(key))
    }

    /// Looks up an entry declared under the exact name `name`.
    pub fn get(&self, name: &str) -> Option<&OptionSpec> {
        self.entries()
            .find(|spec| spec.matcher.is_exact() && spec.matcher.as_str() == name)
    }

    /// Exact names and pattern sources, in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.entries().map(|spec| spec.matcher.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether both schemas hold the very same spec objects in the same order.
    pub fn shares_entries_with(&self, other: &Schema) -> bool {
        self.entries.len() == other.entries.len()
            && self
                .entries
                .iter()
                .zip(&other.entries)
                .all(|(a, b)| Arc::ptr_eq(a, b))
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{Kind, Matcher};

    use super::*;

    #[test]
    fn test_declare_overwrites_exact_name() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new("port").validate(Kind::String));
        schema.declare(OptionSpec::new("port").validate(Kind::Number));

        assert_eq!(schema.len(), 1);
        assert!(matches!(
            schema.get("port").unwrap().validator,
            crate::ValidatorKind::Typed(Kind::Number)
        ));
    }

    #[test]
    fn test_declare_keeps_equal_patterns_apart() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new(Matcher::pattern("^tag_").unwrap()));
        schema.declare(OptionSpec::new(Matcher::pattern("^tag_").unwrap()));

        assert_eq!(schema.len(), 2);
    }

    #[test]
    fn test_find_match_prefers_exact_over_pattern() {
        let mut schema = Schema::new();
        schema.declare(OptionSpec::new(Matcher::pattern("^add_").unwrap()).validate(Kind::Array));
        schema.declare(OptionSpec::new("add_field").validate(Kind::Hash));

        let spec = schema.find_match("add_field").unwrap();
        assert!(spec.matcher.is_exact());
        let spec = schema.find_match("add_tag").unwrap();
        assert!(!spec.matcher.is_exact());
        assert!(schema.find_match("remove_tag").is_none());
    }

    #[test]
    fn test_snapshot_is_shallow_and_independent() {
        let mut parent = Schema::new();
        parent.declare(OptionSpec::new("a"));

        let mut child = parent.snapshot_for_subclass();
        assert!(child.shares_entries_with(&parent));

        parent.declare(OptionSpec::new("b"));
        child.declare(OptionSpec::new("c"));

        assert_eq!(parent.names(), vec!["a", "b"]);
        assert_eq!(child.names(), vec!["a", "c"]);
    }

    #[test]
    fn test_extend_keeps_own_entries_on_collision() {
        let mut parent = Schema::new();
        parent.declare(OptionSpec::new("a").validate(Kind::String));
        parent.declare(OptionSpec::new("b"));

        let mut child = Schema::new();
        child.declare(OptionSpec::new("a").validate(Kind::Number));
        child.extend(&parent);

        assert_eq!(child.names(), vec!["b", "a"]);
        assert!(matches!(
            child.get("a").unwrap().validator,
            crate::ValidatorKind::Typed(Kind::Number)
        ));
    }
}
