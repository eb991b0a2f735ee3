//! Conditional type evaluation.
//!
//! `check extends pattern ? then : else`
//!
//! - A naked type parameter bound to a union distributes: the conditional is
//!   evaluated once per member and the results are unioned. Bound to `never`
//!   it yields `never` (the empty distribution).
//! - Any other check shape is evaluated once against the whole value.
//! - `any` against a non-top pattern takes both branches.

use rustc_hash::FxHashMap;
use tracing::trace;

use crate::diagnostics::{EvalResult, EvaluationError};
use crate::env::Environment;
use crate::expr::{ConditionalExpr, Expression};
use crate::normalize::union_of;
use crate::types::*;

use super::super::evaluate::TypeEvaluator;
use super::infer_pattern::MatchOutcome;

impl TypeEvaluator {
    pub(crate) fn evaluate_conditional(
        &mut self,
        cond: &ConditionalExpr,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        if let Some(name) = cond.check.as_naked_ref()
            && let Some(bound) = env.lookup(name)
        {
            match bound {
                TypeValue::Union(members) => {
                    trace!(
                        param = %name,
                        members = members.len(),
                        "evaluate_conditional: distributing"
                    );
                    let members = members.members().to_vec();
                    let mut results = Vec::with_capacity(members.len());
                    for member in members {
                        let mut single = FxHashMap::default();
                        single.insert(name.clone(), member.clone());
                        let member_env = env.child(single);
                        results.push(self.evaluate_conditional_once(&member, cond, &member_env)?);
                    }
                    return Ok(union_of(results));
                }
                TypeValue::Never => return Ok(TypeValue::Never),
                _ => {}
            }
        }

        let check = self.evaluate_in(&cond.check, env)?;
        self.evaluate_conditional_once(&check, cond, env)
    }

    fn evaluate_conditional_once(
        &mut self,
        check: &TypeValue,
        cond: &ConditionalExpr,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        if check.is_any() && !self.is_top_pattern(&cond.pattern, env)? {
            let bindings: FxHashMap<Name, TypeValue> = cond
                .pattern
                .infer_names()
                .into_iter()
                .map(|name| (name, TypeValue::Any))
                .collect();
            let then_value = self.evaluate_in(&cond.then_branch, &env.child(bindings))?;
            let else_value = self.evaluate_in(&cond.else_branch, env)?;
            return Ok(union_of([then_value, else_value]));
        }

        match self.match_pattern(check, &cond.pattern, env)? {
            MatchOutcome::Matched(bindings) => {
                trace!(
                    subject = %check,
                    captured = bindings.len(),
                    "evaluate_conditional: matched"
                );
                self.evaluate_in(&cond.then_branch, &env.child(bindings))
            }
            MatchOutcome::Failed => self.evaluate_in(&cond.else_branch, env),
            MatchOutcome::Ambiguous(pattern) => Err(EvaluationError::MatchAmbiguous {
                pattern,
                subject: check.to_string(),
            }),
        }
    }

    /// Patterns every value matches: `any`, `unknown` and an unconstrained `infer X`.
    fn is_top_pattern(&mut self, pattern: &Expression, env: &Environment<'_>) -> EvalResult<bool> {
        match pattern {
            Expression::Infer(infer) => Ok(infer.constraint.is_none()),
            _ if pattern.contains_infer() => Ok(false),
            _ => Ok(matches!(
                self.evaluate_in(pattern, env)?,
                TypeValue::Any | TypeValue::Unknown
            )),
        }
    }
}
