//! Expression evaluation.
//!
//! `TypeEvaluator` dispatches over `Expression` variants and threads an
//! `Environment` downward. The rules for the non-trivial variants live in
//! `evaluate_rules/*`, one `impl TypeEvaluator` block per concern:
//! - conditional types and naked-parameter distribution
//! - structural pattern matching with `infer` capture
//! - mapped types, indexed access, `keyof`
//! - template literals and string intrinsics
//! - definition application with the recursion guard
//!
//! Key design:
//! - Every value returned by a step is normalized
//! - Errors short-circuit and are returned verbatim
//! - One evaluator serves one top-level call at a time; its guard and memo
//!   table are reset at the start of each call

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::diagnostics::{EvalResult, EvaluationError};
use crate::env::Environment;
use crate::expr::{Expression, FunctionExpr, TupleExpr};
use crate::normalize::{intersection_of, normalize, union_of};
use crate::options::EvaluatorOptions;
use crate::recursion::RecursionGuard;
use crate::types::*;

/// Remaining stack below which a deeper evaluation step switches to a fresh segment.
pub(crate) const STACK_RED_ZONE: usize = 128 * 1024;
/// Size of each freshly allocated stack segment.
pub(crate) const STACK_SEGMENT_SIZE: usize = 4 * 1024 * 1024;

/// Evaluate `expr` in `env` with default options.
pub fn evaluate(expr: &Expression, env: &Environment<'_>) -> EvalResult<TypeValue> {
    TypeEvaluator::new().evaluate(expr, env)
}

pub struct TypeEvaluator {
    options: EvaluatorOptions,
    guard: RecursionGuard,
    /// `Apply` results for the current top-level call, keyed by definition
    /// name and evaluated arguments.
    memo: FxHashMap<(Name, Vec<TypeValue>), TypeValue>,
}

impl Default for TypeEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeEvaluator {
    pub fn new() -> Self {
        Self::with_options(EvaluatorOptions::default())
    }

    pub fn with_options(options: EvaluatorOptions) -> Self {
        let guard = RecursionGuard::with_profile(options.recursion_profile());
        Self {
            options,
            guard,
            memo: FxHashMap::default(),
        }
    }

    pub fn options(&self) -> &EvaluatorOptions {
        &self.options
    }

    // =========================================================================
    // Accessor methods for evaluate_rules modules
    // =========================================================================

    #[inline]
    pub(crate) fn guard_mut(&mut self) -> &mut RecursionGuard {
        &mut self.guard
    }

    #[inline]
    pub(crate) fn memo_get(&self, name: &Name, args: &[TypeValue]) -> Option<TypeValue> {
        if !self.options.memoize {
            return None;
        }
        self.memo.get(&(name.clone(), args.to_vec())).cloned()
    }

    #[inline]
    pub(crate) fn memo_insert(&mut self, name: Name, args: Vec<TypeValue>, value: TypeValue) {
        if self.options.memoize {
            self.memo.insert((name, args), value);
        }
    }

    pub(crate) fn recursion_limit_error(&self) -> EvaluationError {
        EvaluationError::RecursionLimit {
            depth: self.guard.max_depth(),
        }
    }

    pub(crate) fn iteration_limit_error(&self) -> EvaluationError {
        EvaluationError::IterationLimit {
            limit: self.guard.max_iterations(),
        }
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Evaluate `expr` as a fresh top-level call.
    pub fn evaluate(&mut self, expr: &Expression, env: &Environment<'_>) -> EvalResult<TypeValue> {
        self.guard.reset();
        self.memo.clear();
        let result = self.evaluate_in(expr, env);
        debug!(
            steps = self.guard.iterations(),
            memoized = self.memo.len(),
            ok = result.is_ok(),
            "TypeEvaluator::evaluate"
        );
        self.memo.clear();
        result
    }

    /// Evaluate a sub-expression of the current call.
    pub(crate) fn evaluate_in(
        &mut self,
        expr: &Expression,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        if !self.guard.step() {
            return Err(self.iteration_limit_error());
        }
        stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            self.visit_expression(expr, env)
        })
    }

    fn visit_expression(&mut self, expr: &Expression, env: &Environment<'_>) -> EvalResult<TypeValue> {
        match expr {
            Expression::Ref(name) => self.resolve_ref(name, env),
            Expression::Lit(value) => Ok(normalize(value)),
            Expression::Object(fields) => {
                let mut record = RecordType::new();
                for field in fields {
                    let type_value = self.evaluate_in(&field.value, env)?;
                    record.fields.insert(
                        field.name.clone(),
                        FieldInfo {
                            type_value,
                            optional: field.optional,
                            readonly: field.readonly,
                        },
                    );
                }
                Ok(TypeValue::Record(record))
            }
            Expression::Tuple(tuple) => self.evaluate_tuple(tuple, env),
            Expression::Union(members) => {
                let values = self.evaluate_all(members, env)?;
                Ok(union_of(values))
            }
            Expression::Intersection(members) => {
                let values = self.evaluate_all(members, env)?;
                Ok(intersection_of(values))
            }
            Expression::Conditional(cond) => self.evaluate_conditional(cond, env),
            Expression::Infer(infer) => Err(EvaluationError::InvalidInferPosition {
                name: infer.name.clone(),
            }),
            Expression::IndexedAccess(target, key) => {
                let target = self.evaluate_in(target, env)?;
                let key = self.evaluate_in(key, env)?;
                self.evaluate_index_access(&target, &key)
            }
            Expression::Keyof(target) => {
                let target = self.evaluate_in(target, env)?;
                Ok(self.evaluate_keyof(&target))
            }
            Expression::Mapped(mapped) => self.evaluate_mapped(mapped, env),
            Expression::TemplateLiteral(parts) => self.evaluate_template_literal(parts, env),
            Expression::Apply(name, args) => self.evaluate_application(name, args, env),
            Expression::Function(function) => self.evaluate_function(function, env),
            Expression::StringIntrinsic(kind, arg) => {
                let arg = self.evaluate_in(arg, env)?;
                self.evaluate_string_intrinsic(*kind, &arg)
            }
        }
    }

    pub(crate) fn evaluate_all(
        &mut self,
        exprs: &[Expression],
        env: &Environment<'_>,
    ) -> EvalResult<Vec<TypeValue>> {
        let mut values = Vec::with_capacity(exprs.len());
        for expr in exprs {
            values.push(self.evaluate_in(expr, env)?);
        }
        Ok(values)
    }

    /// Binding scope first, then a definition with no required parameters.
    fn resolve_ref(&mut self, name: &Name, env: &Environment<'_>) -> EvalResult<TypeValue> {
        if let Some(value) = env.lookup(name) {
            return Ok(value.clone());
        }
        match env.definitions().get(name) {
            Some(def) if def.required_params() == 0 => {
                trace!(name = %name, "resolve_ref: zero-argument application");
                self.apply_definition(&def, Vec::new(), env)
            }
            Some(def) => Err(EvaluationError::ArityMismatch {
                target: name.clone(),
                expected: def.arity_description(),
                found: 0,
            }),
            None => Err(EvaluationError::UnboundReference { name: name.clone() }),
        }
    }

    /// `[a, ...T, b?]`: spread tuples splice in place; a spread of any other
    /// value becomes the rest element type, and fixed elements after a rest
    /// fold into it.
    fn evaluate_tuple(&mut self, tuple: &TupleExpr, env: &Environment<'_>) -> EvalResult<TypeValue> {
        let mut elements: Vec<TupleElement> = Vec::with_capacity(tuple.elements.len());
        let mut rest: Option<TypeValue> = None;

        let trailing = tuple.rest.as_deref().map(|r| (r, true, false));
        let parts = tuple
            .elements
            .iter()
            .map(|e| (&e.value, e.spread, e.optional))
            .chain(trailing);

        for (expr, spread, optional) in parts {
            let value = self.evaluate_in(expr, env)?;
            if !spread {
                match rest.take() {
                    Some(existing) => rest = Some(union_of([existing, value])),
                    None => elements.push(TupleElement {
                        type_value: value,
                        optional,
                    }),
                }
                continue;
            }
            match value {
                TypeValue::Tuple(inner) => match rest.take() {
                    Some(existing) => {
                        let mut folded = vec![existing];
                        folded.extend(inner.elements.into_iter().map(|e| e.type_value));
                        folded.extend(inner.rest.map(|r| *r));
                        rest = Some(union_of(folded));
                    }
                    None => {
                        elements.extend(inner.elements);
                        rest = inner.rest.map(|r| *r);
                    }
                },
                TypeValue::Never => {}
                other => {
                    rest = Some(match rest.take() {
                        Some(existing) => union_of([existing, other]),
                        None => other,
                    });
                }
            }
        }

        Ok(TypeValue::Tuple(TupleType::new(elements, rest)))
    }

    fn evaluate_function(
        &mut self,
        function: &FunctionExpr,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        let mut params = self.evaluate_all(&function.params, env)?;
        let mut rest = None;
        if let Some(rest_expr) = &function.rest {
            match self.evaluate_in(rest_expr, env)? {
                TypeValue::Tuple(tuple) => {
                    params.extend(tuple.elements.into_iter().map(|e| e.type_value));
                    rest = tuple.rest.map(|r| *r);
                }
                other => rest = Some(other),
            }
        }
        let returns = self.evaluate_in(&function.returns, env)?;
        Ok(TypeValue::Function(FunctionType {
            params,
            rest: rest.map(Box::new),
            returns: Box::new(returns),
        }))
    }
}
