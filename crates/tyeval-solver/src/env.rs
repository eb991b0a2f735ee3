//! Layered binding scopes.
//!
//! An `Environment` is an immutable chain of scopes plus a handle on the
//! definition table. Extending it never mutates the parent, so evaluation
//! threads environments downward by value and discards them on return.
//!
//! Two kinds of extension exist:
//! - [`Environment::child`] layers new bindings over the current scope
//!   (conditional then-branches, mapped-type keys)
//! - [`Environment::application_scope`] layers parameter bindings over the
//!   *root* scope, so a definition body never sees the caller's locals

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::def::DefinitionStore;
use crate::normalize::normalize;
use crate::types::{Name, TypeValue};

#[derive(Debug)]
struct Scope {
    bindings: FxHashMap<Name, TypeValue>,
    parent: Option<Arc<Scope>>,
}

#[derive(Clone, Debug)]
pub struct Environment<'a> {
    definitions: &'a DefinitionStore,
    scope: Option<Arc<Scope>>,
    root: Option<Arc<Scope>>,
}

impl<'a> Environment<'a> {
    /// Empty environment over `definitions`.
    pub fn new(definitions: &'a DefinitionStore) -> Self {
        Self {
            definitions,
            scope: None,
            root: None,
        }
    }

    /// Add a top-level binding.
    ///
    /// Intended for callers seeding the environment before evaluation: the
    /// resulting scope becomes the root seen by every definition body.
    pub fn with_binding(self, name: &str, value: TypeValue) -> Self {
        let mut bindings = FxHashMap::default();
        bindings.insert(Name::from(name), value);
        self.with_bindings(bindings)
    }

    /// Add several top-level bindings at once. See [`with_binding`](Self::with_binding).
    ///
    /// Values are normalized on the way in; caller-built values may hold
    /// nested or duplicated unions.
    pub fn with_bindings(self, bindings: FxHashMap<Name, TypeValue>) -> Self {
        let bindings = bindings
            .into_iter()
            .map(|(name, value)| {
                let value = normalize(&value);
                (name, value)
            })
            .collect();
        let scope = Arc::new(Scope {
            bindings,
            parent: self.scope,
        });
        Self {
            definitions: self.definitions,
            scope: Some(Arc::clone(&scope)),
            root: Some(scope),
        }
    }

    /// A fresh scope layered over the current one.
    pub fn child(&self, bindings: FxHashMap<Name, TypeValue>) -> Self {
        if bindings.is_empty() {
            return self.clone();
        }
        Self {
            definitions: self.definitions,
            scope: Some(Arc::new(Scope {
                bindings,
                parent: self.scope.clone(),
            })),
            root: self.root.clone(),
        }
    }

    /// A fresh scope layered over the root scope, for a definition body.
    pub fn application_scope(&self, bindings: FxHashMap<Name, TypeValue>) -> Self {
        Self {
            definitions: self.definitions,
            scope: Some(Arc::new(Scope {
                bindings,
                parent: self.root.clone(),
            })),
            root: self.root.clone(),
        }
    }

    /// Look `name` up through the scope chain, innermost first.
    pub fn lookup(&self, name: &str) -> Option<&TypeValue> {
        let mut current = self.scope.as_deref();
        while let Some(scope) = current {
            if let Some(value) = scope.bindings.get(name) {
                return Some(value);
            }
            current = scope.parent.as_deref();
        }
        None
    }

    pub fn definitions(&self) -> &'a DefinitionStore {
        self.definitions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bind(name: &str, value: TypeValue) -> FxHashMap<Name, TypeValue> {
        let mut bindings = FxHashMap::default();
        bindings.insert(Name::from(name), value);
        bindings
    }

    #[test]
    fn child_shadows_and_falls_through() {
        let store = DefinitionStore::new();
        let env = Environment::new(&store)
            .with_binding("T", TypeValue::STRING)
            .with_binding("U", TypeValue::NUMBER);
        let child = env.child(bind("T", TypeValue::BOOLEAN));
        assert_eq!(child.lookup("T"), Some(&TypeValue::BOOLEAN));
        assert_eq!(child.lookup("U"), Some(&TypeValue::NUMBER));
        assert_eq!(env.lookup("T"), Some(&TypeValue::STRING));
        assert_eq!(child.lookup("V"), None);
    }

    #[test]
    fn application_scope_skips_intermediate_scopes() {
        let store = DefinitionStore::new();
        let env = Environment::new(&store).with_binding("Top", TypeValue::STRING);
        let local = env.child(bind("Local", TypeValue::NUMBER));
        let app = local.application_scope(bind("T", TypeValue::BOOLEAN));
        assert_eq!(app.lookup("T"), Some(&TypeValue::BOOLEAN));
        assert_eq!(app.lookup("Top"), Some(&TypeValue::STRING));
        assert_eq!(app.lookup("Local"), None);
    }

    #[test]
    fn top_level_bindings_are_normalized() {
        let store = DefinitionStore::new();
        let raw = TypeValue::Union(crate::types::TypeList::new(vec![
            TypeValue::Never,
            TypeValue::literal_string("a"),
            TypeValue::literal_string("a"),
        ]));
        let env = Environment::new(&store).with_binding("T", raw);
        assert_eq!(env.lookup("T"), Some(&TypeValue::literal_string("a")));
    }
}
