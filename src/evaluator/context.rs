//! Variable bindings for evaluation

use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Read-only mapping from variable name to value.
///
/// A context may sit on top of a parent: lookups fall through to the parent
/// when a name is not bound locally. `Substitution` uses this to bind names
/// for its body without touching the caller's bindings.
#[derive(Debug, Clone)]
pub struct Context<'p, V> {
    bindings: FxHashMap<Arc<str>, V>,
    parent: Option<&'p Context<'p, V>>,
}

impl<'p, V> Context<'p, V> {
    /// Empty context
    pub fn new() -> Self {
        Self {
            bindings: FxHashMap::default(),
            parent: None,
        }
    }

    /// Add a binding, returning the context (builder style)
    pub fn bind(mut self, name: impl Into<Arc<str>>, value: V) -> Self {
        self.insert(name, value);
        self
    }

    /// Add or replace a local binding
    pub fn insert(&mut self, name: impl Into<Arc<str>>, value: V) {
        self.bindings.insert(name.into(), value);
    }

    /// Look a name up here, then in the parents
    pub fn get(&self, name: &str) -> Option<&V> {
        let mut scope = Some(self);
        while let Some(ctx) = scope {
            if let Some(value) = ctx.bindings.get(name) {
                return Some(value);
            }
            scope = ctx.parent;
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Empty scope whose lookups fall back to `self`
    pub fn child(&self) -> Context<'_, V> {
        Context {
            bindings: FxHashMap::default(),
            parent: Some(self),
        }
    }
}

impl<V> Default for Context<'_, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for Context<'_, V>
where
    K: Into<Arc<str>>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            bindings: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
            parent: None,
        }
    }
}
