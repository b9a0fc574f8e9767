//! Insertion-ordered collection of specs keyed by alias.

use super::field_spec::FieldSpec;

/// Specs in declaration order. Inserting an alias that already exists
/// replaces the earlier spec in place.
#[derive(Debug, Clone, Default)]
pub struct SpecSet {
    specs: Vec<FieldSpec>,
}

impl SpecSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, spec: FieldSpec) {
        match self
            .specs
            .iter_mut()
            .find(|s| s.key_alias() == spec.key_alias())
        {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
    }

    pub fn get(&self, alias: &str) -> Option<&FieldSpec> {
        self.specs.iter().find(|s| s.key_alias() == alias)
    }

    pub fn get_mut(&mut self, alias: &str) -> Option<&mut FieldSpec> {
        self.specs.iter_mut().find(|s| s.key_alias() == alias)
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.get(alias).is_some()
    }

    pub fn retain<F: FnMut(&FieldSpec) -> bool>(&mut self, f: F) {
        self.specs.retain(f);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FieldSpec> {
        self.specs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, FieldSpec> {
        self.specs.iter_mut()
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(FieldSpec::key_alias)
    }

    /// Whether `path` is the plural path of some spec.
    pub fn is_plural_path(&self, path: &str) -> bool {
        !path.is_empty() && self.specs.iter().any(|s| s.plural() == path)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn clear(&mut self) {
        self.specs.clear();
    }
}

impl<'a> IntoIterator for &'a SpecSet {
    type Item = &'a FieldSpec;
    type IntoIter = std::slice::Iter<'a, FieldSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
