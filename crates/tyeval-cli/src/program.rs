//! JSON program documents.
//!
//! A program is the serde form of the solver's AST:
//!
//! ```json
//! {
//!   "definitions": [{ "name": "Id", "params": [{ "name": "T" }], "body": { "Ref": "T" } }],
//!   "bindings": { "X": { "Primitive": "string" } },
//!   "expression": { "Apply": ["Id", [{ "Ref": "X" }]] }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use tyeval_solver::{DefinitionInfo, DefinitionStore, Environment, Expression, Name, TypeValue};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Program {
    #[serde(default)]
    pub definitions: Vec<DefinitionInfo>,
    /// Top-level bindings, visible to the expression and every definition body.
    #[serde(default)]
    pub bindings: BTreeMap<String, TypeValue>,
    pub expression: Expression,
}

impl Program {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid program document")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read program {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("failed to load program {}", path.display()))
    }

    /// Register the program's definitions. Later definitions overwrite earlier ones.
    pub fn install(&self, store: &DefinitionStore) {
        for definition in &self.definitions {
            store.define(definition.clone());
        }
        debug!(
            definitions = self.definitions.len(),
            total = store.len(),
            "installed program definitions"
        );
    }

    /// The top-level environment for this program over `store`.
    pub fn environment<'a>(&self, store: &'a DefinitionStore) -> Environment<'a> {
        if self.bindings.is_empty() {
            return Environment::new(store);
        }
        let bindings = self
            .bindings
            .iter()
            .map(|(name, value)| (Name::from(name.as_str()), value.clone()))
            .collect();
        Environment::new(store).with_bindings(bindings)
    }
}
