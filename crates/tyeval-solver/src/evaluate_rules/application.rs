//! Definition application: `Name<args>`.
//!
//! Arguments are evaluated in the caller's scope, then bound to the
//! definition's parameters in a scope layered over the root of the current
//! call. Each application counts one level against the recursion guard.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::def::DefinitionInfo;
use crate::diagnostics::{EvalResult, EvaluationError};
use crate::env::Environment;
use crate::expr::Expression;
use crate::recursion::RecursionResult;
use crate::types::*;

use super::super::evaluate::TypeEvaluator;

impl TypeEvaluator {
    pub(crate) fn evaluate_application(
        &mut self,
        name: &Name,
        args: &[Expression],
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        // A bound type parameter shadows a definition of the same name.
        if let Some(bound) = env.lookup(name) {
            if args.is_empty() {
                return Ok(bound.clone());
            }
            return Err(EvaluationError::ArityMismatch {
                target: name.clone(),
                expected: "0".to_string(),
                found: args.len(),
            });
        }

        let Some(def) = env.definitions().get(name) else {
            return Err(EvaluationError::UnboundReference { name: name.clone() });
        };
        if args.len() < def.required_params() || args.len() > def.total_params() {
            return Err(EvaluationError::ArityMismatch {
                target: name.clone(),
                expected: def.arity_description(),
                found: args.len(),
            });
        }

        let values = self.evaluate_all(args, env)?;
        self.apply_definition(&def, values, env)
    }

    /// Bind `values` (plus defaults for missing trailing parameters) and
    /// evaluate the body.
    pub(crate) fn apply_definition(
        &mut self,
        def: &DefinitionInfo,
        mut values: Vec<TypeValue>,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        let mut bindings: FxHashMap<Name, TypeValue> = FxHashMap::default();
        for (index, param) in def.params.iter().enumerate() {
            if index >= values.len() {
                let default = match &param.default {
                    Some(default) => {
                        let scope = env.application_scope(bindings.clone());
                        self.evaluate_in(default, &scope)?
                    }
                    None => {
                        return Err(EvaluationError::ArityMismatch {
                            target: def.name.clone(),
                            expected: def.arity_description(),
                            found: values.len(),
                        });
                    }
                };
                values.push(default);
            }
            bindings.insert(param.name.clone(), values[index].clone());
        }

        if let Some(cached) = self.memo_get(&def.name, &values) {
            trace!(name = %def.name, "apply_definition: memo hit");
            return Ok(cached);
        }

        match self.guard_mut().enter() {
            RecursionResult::Entered => {}
            RecursionResult::DepthExceeded => {
                trace!(name = %def.name, "apply_definition: depth limit reached");
                return Err(self.recursion_limit_error());
            }
            RecursionResult::IterationExceeded => return Err(self.iteration_limit_error()),
        }

        trace!(
            name = %def.name,
            args = values.len(),
            depth = self.guard_mut().depth(),
            "apply_definition"
        );
        let scope = env.application_scope(bindings);
        let result = self.evaluate_in(&def.body, &scope);
        self.guard_mut().leave();
        let value = result?;

        self.memo_insert(def.name.clone(), values, value.clone());
        Ok(value)
    }
}
