//! Named type definitions.
//!
//! A definition is `(name, params, body)`. Recursion is expressed by the body
//! naming the definition through `Apply`, never by embedding a copy of
//! itself, so the table holds no cyclic data.
//!
//! The store is populated before evaluation and only read afterwards.
//! `DashMap` lets concurrent evaluators share one store.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::trace;

use crate::expr::Expression;
use crate::types::Name;

/// A type parameter with an optional default (`K = T`).
///
/// The default is evaluated in the scope of the earlier parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TypeParamInfo {
    pub name: Name,
    #[serde(default)]
    pub default: Option<Expression>,
}

impl TypeParamInfo {
    pub fn new(name: &str) -> Self {
        Self {
            name: Name::from(name),
            default: None,
        }
    }

    pub fn with_default(name: &str, default: Expression) -> Self {
        Self {
            name: Name::from(name),
            default: Some(default),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DefinitionInfo {
    pub name: Name,
    #[serde(default)]
    pub params: Vec<TypeParamInfo>,
    pub body: Expression,
}

impl DefinitionInfo {
    pub fn new(name: &str, params: Vec<TypeParamInfo>, body: Expression) -> Self {
        Self {
            name: Name::from(name),
            params,
            body,
        }
    }

    /// Parameters without a default.
    ///
    /// Defaults only make sense on trailing parameters; a required parameter
    /// after a defaulted one still counts as required.
    pub fn required_params(&self) -> usize {
        self.params
            .iter()
            .rposition(|p| p.default.is_none())
            .map_or(0, |last| last + 1)
    }

    pub fn total_params(&self) -> usize {
        self.params.len()
    }

    /// Human-readable accepted argument count for arity errors.
    pub fn arity_description(&self) -> String {
        let (required, total) = (self.required_params(), self.total_params());
        if required == total {
            required.to_string()
        } else {
            format!("between {required} and {total}")
        }
    }
}

/// Thread-safe table of type definitions keyed by name.
///
/// ## Usage
///
/// ```ignore
/// let store = DefinitionStore::new();
/// store.define_type("Id", &["T"], Expression::reference("T"));
/// let info = store.get("Id").expect("definition exists");
/// ```
#[derive(Debug, Default)]
pub struct DefinitionStore {
    definitions: DashMap<Name, Arc<DefinitionInfo>>,
}

impl DefinitionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or overwrite a definition with plain (default-less) parameters.
    pub fn define_type(&self, name: &str, params: &[&str], body: Expression) {
        let params = params.iter().map(|p| TypeParamInfo::new(p)).collect();
        self.define(DefinitionInfo::new(name, params, body));
    }

    /// Register or overwrite a definition.
    pub fn define(&self, info: DefinitionInfo) {
        trace!(
            name = %info.name,
            params = info.params.len(),
            "DefinitionStore::define"
        );
        self.definitions.insert(info.name.clone(), Arc::new(info));
    }

    pub fn get(&self, name: &str) -> Option<Arc<DefinitionInfo>> {
        self.definitions.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<Name> {
        let mut names: Vec<Name> = self
            .definitions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_lookup() {
        let store = DefinitionStore::new();
        assert!(store.is_empty());
        store.define_type("Id", &["T"], Expression::reference("T"));
        assert!(store.contains("Id"));
        assert_eq!(store.len(), 1);
        let info = store.get("Id").unwrap();
        assert_eq!(info.total_params(), 1);
        assert_eq!(info.required_params(), 1);
        assert!(store.get("Missing").is_none());
    }

    #[test]
    fn redefinition_overwrites() {
        let store = DefinitionStore::new();
        store.define_type("A", &[], Expression::lit_num(1.0));
        store.define_type("A", &[], Expression::lit_num(2.0));
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("A").unwrap().body, Expression::lit_num(2.0));
    }

    #[test]
    fn defaults_make_trailing_params_optional() {
        let info = DefinitionInfo::new(
            "Permutation",
            vec![
                TypeParamInfo::new("T"),
                TypeParamInfo::with_default("K", Expression::reference("T")),
            ],
            Expression::reference("T"),
        );
        assert_eq!(info.required_params(), 1);
        assert_eq!(info.total_params(), 2);
        assert_eq!(info.arity_description(), "between 1 and 2");
    }

    #[test]
    fn names_are_sorted() {
        let store = DefinitionStore::new();
        store.define_type("B", &[], Expression::never());
        store.define_type("A", &[], Expression::never());
        assert_eq!(store.names(), vec![Name::from("A"), Name::from("B")]);
    }
}
