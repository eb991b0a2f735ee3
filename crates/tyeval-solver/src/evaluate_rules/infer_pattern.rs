//! Structural pattern matching with `infer` capture.
//!
//! A subject `TypeValue` is matched against a pattern `Expression`:
//!
//! - pieces without `infer` are evaluated and compared by assignability
//! - `infer X` captures the subject at its position
//! - tuples, objects, functions and template literals destructure
//! - an `Apply` whose arguments contain `infer` expands into the definition body
//!
//! Captures are collected per name with the variance of their position.
//! A name captured only in covariant positions resolves to the union of its
//! candidates; one captured only in contravariant positions (function
//! parameters) resolves to their intersection.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::trace;

use crate::diagnostics::{EvalResult, EvaluationError};
use crate::env::Environment;
use crate::expr::{Expression, FunctionExpr, InferExpr, ObjectFieldExpr, TupleExpr};
use crate::normalize::{intersection_of, union_of};
use crate::recursion::RecursionResult;
use crate::relation::{is_assignable, tuple_property};
use crate::types::*;

use super::super::evaluate::{STACK_RED_ZONE, STACK_SEGMENT_SIZE, TypeEvaluator};

/// Result of matching a subject against a pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Every captured name with its resolved value.
    Matched(FxHashMap<Name, TypeValue>),
    Failed,
    /// The pattern admits more than one split; carries a description of the pattern.
    Ambiguous(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum MatchStatus {
    Matched,
    Failed,
    Ambiguous(String),
}

impl MatchStatus {
    #[inline]
    pub(crate) fn from_bool(matched: bool) -> Self {
        if matched { Self::Matched } else { Self::Failed }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Variance {
    Covariant,
    Contravariant,
}

impl Variance {
    #[inline]
    pub(crate) fn flip(self) -> Self {
        match self {
            Self::Covariant => Self::Contravariant,
            Self::Contravariant => Self::Covariant,
        }
    }

    /// Compare a subject piece with an evaluated pattern piece.
    #[inline]
    pub(crate) fn relate(self, subject: &TypeValue, target: &TypeValue) -> bool {
        match self {
            Self::Covariant => is_assignable(subject, target),
            Self::Contravariant => is_assignable(target, subject),
        }
    }
}

#[derive(Clone, Debug, Default)]
struct Candidates {
    covariant: SmallVec<[TypeValue; 2]>,
    contravariant: SmallVec<[TypeValue; 2]>,
}

/// Capture candidates collected while matching one pattern.
#[derive(Clone, Debug, Default)]
pub(crate) struct InferBindings {
    candidates: IndexMap<Name, Candidates>,
}

impl InferBindings {
    pub(crate) fn add(&mut self, name: &Name, value: TypeValue, variance: Variance) {
        let entry = self.candidates.entry(name.clone()).or_default();
        match variance {
            Variance::Covariant => entry.covariant.push(value),
            Variance::Contravariant => entry.contravariant.push(value),
        }
    }

    /// Bind every `infer` name in `pattern` to `value`.
    pub(crate) fn add_all(&mut self, pattern: &Expression, value: &TypeValue, variance: Variance) {
        for name in pattern.infer_names() {
            self.add(&name, value.clone(), variance);
        }
    }

    fn resolve(self) -> FxHashMap<Name, TypeValue> {
        self.candidates
            .into_iter()
            .map(|(name, candidates)| {
                let value = if candidates.covariant.is_empty() {
                    intersection_of(candidates.contravariant)
                } else {
                    union_of(candidates.covariant)
                };
                (name, value)
            })
            .collect()
    }
}

/// Propagate any non-`Matched` status to the caller.
macro_rules! try_match {
    ($status:expr) => {
        match $status? {
            MatchStatus::Matched => {}
            other => return Ok(other),
        }
    };
}
pub(crate) use try_match;

/// A fixed tuple slot of a pattern.
enum SlotPattern<'e> {
    /// Destructured by the matcher.
    Expr(&'e Expression),
    /// Already evaluated; compared by assignability.
    Value(TypeValue),
}

struct FixedSlot<'e> {
    pattern: SlotPattern<'e>,
    optional: bool,
}

impl TypeEvaluator {
    /// Match `subject` against `pattern`.
    ///
    /// Every `infer` name of the pattern is bound in a `Matched` outcome;
    /// names no branch captured are bound to `unknown`.
    pub fn match_pattern(
        &mut self,
        subject: &TypeValue,
        pattern: &Expression,
        env: &Environment<'_>,
    ) -> EvalResult<MatchOutcome> {
        let mut bindings = InferBindings::default();
        let status = self.match_into(subject, pattern, env, Variance::Covariant, &mut bindings)?;
        Ok(match status {
            MatchStatus::Matched => {
                let mut resolved = bindings.resolve();
                for name in pattern.infer_names() {
                    resolved.entry(name).or_insert(TypeValue::Unknown);
                }
                MatchOutcome::Matched(resolved)
            }
            MatchStatus::Failed => MatchOutcome::Failed,
            MatchStatus::Ambiguous(description) => MatchOutcome::Ambiguous(description),
        })
    }

    pub(crate) fn match_into(
        &mut self,
        subject: &TypeValue,
        pattern: &Expression,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        if !pattern.contains_infer() {
            let target = self.evaluate_in(pattern, env)?;
            return Ok(MatchStatus::from_bool(variance.relate(subject, &target)));
        }
        if let Expression::Infer(infer) = pattern {
            return self.capture_infer(subject, infer, env, variance, bindings);
        }

        // `never` (covariant) and `any` fit every shape.
        let absorbs = match variance {
            Variance::Covariant => matches!(subject, TypeValue::Never | TypeValue::Any),
            Variance::Contravariant => matches!(subject, TypeValue::Any | TypeValue::Unknown),
        };
        if absorbs {
            bindings.add_all(pattern, subject, variance);
            return Ok(MatchStatus::Matched);
        }

        if let TypeValue::Union(members) = subject {
            return match variance {
                Variance::Covariant => {
                    for member in members {
                        try_match!(self.match_into(member, pattern, env, variance, bindings));
                    }
                    Ok(MatchStatus::Matched)
                }
                Variance::Contravariant => {
                    self.match_first(members.members(), pattern, env, variance, bindings)
                }
            };
        }

        match pattern {
            Expression::Union(alternatives) => {
                for alternative in alternatives {
                    let mut scratch = bindings.clone();
                    match self.match_into(subject, alternative, env, variance, &mut scratch)? {
                        MatchStatus::Matched => {
                            *bindings = scratch;
                            return Ok(MatchStatus::Matched);
                        }
                        MatchStatus::Failed => {}
                        ambiguous => return Ok(ambiguous),
                    }
                }
                return Ok(MatchStatus::Failed);
            }
            Expression::Intersection(parts) => {
                for part in parts {
                    try_match!(self.match_into(subject, part, env, variance, bindings));
                }
                return Ok(MatchStatus::Matched);
            }
            _ => {}
        }

        if let TypeValue::Intersection(members) = subject
            && variance == Variance::Covariant
        {
            return self.match_first(members.members(), pattern, env, variance, bindings);
        }

        match (pattern, subject) {
            (Expression::Tuple(tuple_pattern), TypeValue::Tuple(tuple)) => {
                self.match_tuple(tuple, tuple_pattern, env, variance, bindings)
            }
            (Expression::Object(fields), TypeValue::Record(_) | TypeValue::Tuple(_)) => {
                self.match_object(subject, fields, env, variance, bindings)
            }
            (Expression::Function(function_pattern), TypeValue::Function(function)) => {
                self.match_function(function, function_pattern, env, variance, bindings)
            }
            (Expression::TemplateLiteral(parts), _) => {
                self.match_template_literal(subject, parts, env, variance, bindings)
            }
            (Expression::Apply(name, args), _) => {
                self.match_application(subject, name, args, env, variance, bindings)
            }
            (
                Expression::Conditional(_)
                | Expression::IndexedAccess(..)
                | Expression::Keyof(_)
                | Expression::Mapped(_)
                | Expression::StringIntrinsic(..),
                _,
            ) => Err(invalid_infer_position(pattern)),
            _ => Ok(MatchStatus::Failed),
        }
    }

    /// First member of `subjects` that matches wins; its captures are kept.
    fn match_first(
        &mut self,
        subjects: &[TypeValue],
        pattern: &Expression,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        for subject in subjects {
            let mut scratch = bindings.clone();
            match self.match_into(subject, pattern, env, variance, &mut scratch)? {
                MatchStatus::Matched => {
                    *bindings = scratch;
                    return Ok(MatchStatus::Matched);
                }
                MatchStatus::Failed => {}
                ambiguous => return Ok(ambiguous),
            }
        }
        Ok(MatchStatus::Failed)
    }

    pub(crate) fn capture_infer(
        &mut self,
        subject: &TypeValue,
        infer: &InferExpr,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        if let Some(constraint) = &infer.constraint {
            let constraint = self.evaluate_in(constraint, env)?;
            if !is_assignable(subject, &constraint) {
                trace!(
                    name = %infer.name,
                    subject = %subject,
                    constraint = %constraint,
                    "capture_infer: constraint not satisfied"
                );
                return Ok(MatchStatus::Failed);
            }
        }
        bindings.add(&infer.name, subject.clone(), variance);
        Ok(MatchStatus::Matched)
    }

    // =========================================================================
    // Tuples
    // =========================================================================

    /// `[prefix..., ...variadic, suffix...]` against a tuple subject.
    ///
    /// At most one variadic element (spread or trailing rest) is allowed; it
    /// captures the middle slice of the subject as a tuple. An arity
    /// mismatch is a plain match failure.
    fn match_tuple(
        &mut self,
        subject: &TupleType,
        pattern: &TupleExpr,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        let mut prefix: Vec<FixedSlot<'_>> = Vec::new();
        let mut suffix: Vec<FixedSlot<'_>> = Vec::new();
        let mut variadic: Option<SlotPattern<'_>> = None;

        let trailing = pattern.rest.as_deref().map(|rest| (rest, true, false));
        let parts = pattern
            .elements
            .iter()
            .map(|e| (&e.value, e.spread, e.optional))
            .chain(trailing);

        for (expr, spread, optional) in parts {
            let slots = if variadic.is_some() { &mut suffix } else { &mut prefix };
            if !spread {
                slots.push(FixedSlot {
                    pattern: SlotPattern::Expr(expr),
                    optional,
                });
                continue;
            }
            let slot = if expr.contains_infer() {
                SlotPattern::Expr(expr)
            } else {
                match self.evaluate_in(expr, env)? {
                    // A closed tuple spread is just more fixed slots.
                    TypeValue::Tuple(tuple) if tuple.rest.is_none() => {
                        slots.extend(tuple.elements.into_iter().map(|e| FixedSlot {
                            pattern: SlotPattern::Value(e.type_value),
                            optional: e.optional,
                        }));
                        continue;
                    }
                    other => SlotPattern::Value(other),
                }
            };
            if variadic.is_some() {
                return Ok(MatchStatus::Ambiguous(
                    "tuple pattern with more than one variadic element".to_string(),
                ));
            }
            variadic = Some(slot);
        }

        let len = subject.elements.len();
        let Some(variadic) = variadic else {
            if subject.rest.is_some() || len > prefix.len() {
                return Ok(MatchStatus::Failed);
            }
            for (index, slot) in prefix.iter().enumerate() {
                match subject.elements.get(index) {
                    Some(element) => {
                        if element.optional && !slot.optional {
                            return Ok(MatchStatus::Failed);
                        }
                        try_match!(self.match_slot(&element.type_value, slot, env, variance, bindings));
                    }
                    None if slot.optional => {
                        if let SlotPattern::Expr(expr) = slot.pattern {
                            bindings.add_all(expr, &TypeValue::Unknown, variance);
                        }
                    }
                    None => return Ok(MatchStatus::Failed),
                }
            }
            return Ok(MatchStatus::Matched);
        };

        let (p, q) = (prefix.len(), suffix.len());
        if len < p + q || (subject.rest.is_some() && q > 0) {
            return Ok(MatchStatus::Failed);
        }
        let fixed = prefix
            .iter()
            .zip(&subject.elements[..p])
            .chain(suffix.iter().zip(&subject.elements[len - q..]));
        for (slot, element) in fixed {
            if element.optional && !slot.optional {
                return Ok(MatchStatus::Failed);
            }
            try_match!(self.match_slot(&element.type_value, slot, env, variance, bindings));
        }

        let middle = TupleType {
            elements: subject.elements[p..len - q].to_vec(),
            rest: subject.rest.clone(),
        };
        trace!(
            prefix = p,
            suffix = q,
            middle = middle.elements.len(),
            "match_tuple: variadic slice"
        );
        match variadic {
            SlotPattern::Expr(expr) => {
                self.match_into(&TypeValue::Tuple(middle), expr, env, variance, bindings)
            }
            SlotPattern::Value(TypeValue::Tuple(tuple)) => Ok(MatchStatus::from_bool(
                variance.relate(&TypeValue::Tuple(middle), &TypeValue::Tuple(tuple)),
            )),
            SlotPattern::Value(element_type) => {
                let matched = middle
                    .elements
                    .iter()
                    .map(|e| &e.type_value)
                    .chain(middle.rest.as_deref())
                    .all(|value| variance.relate(value, &element_type));
                Ok(MatchStatus::from_bool(matched))
            }
        }
    }

    fn match_slot(
        &mut self,
        subject: &TypeValue,
        slot: &FixedSlot<'_>,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        match &slot.pattern {
            SlotPattern::Expr(expr) => self.match_into(subject, expr, env, variance, bindings),
            SlotPattern::Value(value) => Ok(MatchStatus::from_bool(variance.relate(subject, value))),
        }
    }

    // =========================================================================
    // Objects and functions
    // =========================================================================

    /// Width subtyping: every pattern field must exist in the subject.
    fn match_object(
        &mut self,
        subject: &TypeValue,
        fields: &[ObjectFieldExpr],
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        for field in fields {
            let found = match subject {
                TypeValue::Record(record) => record
                    .get(&field.name)
                    .map(|f| (f.type_value.clone(), f.optional)),
                TypeValue::Tuple(tuple) => tuple_property(tuple, &field.name).map(|v| (v, false)),
                _ => None,
            };
            match found {
                Some((value, optional)) => {
                    if optional && !field.optional {
                        return Ok(MatchStatus::Failed);
                    }
                    try_match!(self.match_into(&value, &field.value, env, variance, bindings));
                }
                None if field.optional => {
                    bindings.add_all(&field.value, &TypeValue::Unknown, variance);
                }
                None => return Ok(MatchStatus::Failed),
            }
        }
        Ok(MatchStatus::Matched)
    }

    /// Parameters are matched contravariantly, the return covariantly. A
    /// pattern rest captures the remaining parameters as a tuple.
    fn match_function(
        &mut self,
        subject: &FunctionType,
        pattern: &FunctionExpr,
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
        let param_variance = variance.flip();
        for (index, param) in pattern.params.iter().enumerate() {
            match subject.params.get(index).or(subject.rest.as_deref()) {
                Some(subject_param) => {
                    try_match!(self.match_into(subject_param, param, env, param_variance, bindings));
                }
                // A shorter parameter list is always acceptable.
                None => bindings.add_all(param, &TypeValue::Unknown, param_variance),
            }
        }

        match &pattern.rest {
            Some(rest) => {
                let remaining = TupleType::new(
                    subject
                        .params
                        .iter()
                        .skip(pattern.params.len())
                        .cloned()
                        .map(TupleElement::required)
                        .collect(),
                    subject.rest.as_deref().cloned(),
                );
                try_match!(self.match_into(&TypeValue::Tuple(remaining), rest, env, variance, bindings));
            }
            None if subject.params.len() > pattern.params.len() => {
                return Ok(MatchStatus::Failed);
            }
            None => {}
        }

        self.match_into(&subject.returns, &pattern.returns, env, variance, bindings)
    }

    // =========================================================================
    // Applications
    // =========================================================================

    /// `Foo<infer X>` in a pattern: substitute the arguments into the body of
    /// `Foo` and match against the expansion.
    ///
    /// Arguments are closed over the caller's scope first: plain arguments are
    /// evaluated, and caller bindings inside `infer`-bearing arguments are
    /// inlined. The expansion is then matched in a scope over the top-level
    /// bindings only, so the body never sees the caller's locals.
    fn match_application(
        &mut self,
        subject: &TypeValue,
        name: &Name,
        args: &[Expression],
        env: &Environment<'_>,
        variance: Variance,
        bindings: &mut InferBindings,
    ) -> EvalResult<MatchStatus> {
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

        let mut replacements: FxHashMap<Name, Expression> = FxHashMap::default();
        for (index, param) in def.params.iter().enumerate() {
            let arg = match (args.get(index), &param.default) {
                (Some(arg), _) if arg.contains_infer() => close_over_scope(arg, env),
                (Some(arg), _) => Expression::Lit(self.evaluate_in(arg, env)?),
                (None, Some(default)) => default.substitute(&replacements),
                (None, None) => Expression::Lit(TypeValue::Unknown),
            };
            replacements.insert(param.name.clone(), arg);
        }
        let expanded = def.body.substitute(&replacements);
        let body_env = env.application_scope(FxHashMap::default());

        match self.guard_mut().enter() {
            RecursionResult::Entered => {}
            RecursionResult::DepthExceeded => return Err(self.recursion_limit_error()),
            RecursionResult::IterationExceeded => return Err(self.iteration_limit_error()),
        }
        trace!(name = %name, "match_application: expanded pattern");
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT_SIZE, || {
            self.match_into(subject, &expanded, &body_env, variance, bindings)
        });
        self.guard_mut().leave();
        result
    }
}

/// Inline the caller's bindings into a pattern argument. Names the argument
/// itself captures are left alone.
fn close_over_scope(pattern: &Expression, env: &Environment<'_>) -> Expression {
    let captured = pattern.infer_names();
    let replacements: FxHashMap<Name, Expression> = pattern
        .referenced_names()
        .into_iter()
        .filter(|name| !captured.contains(name))
        .filter_map(|name| {
            let value = env.lookup(&name)?.clone();
            Some((name, Expression::Lit(value)))
        })
        .collect();
    pattern.substitute(&replacements)
}

fn invalid_infer_position(pattern: &Expression) -> EvaluationError {
    let name = pattern
        .infer_names()
        .into_iter()
        .next()
        .unwrap_or_else(|| Name::from("?"));
    EvaluationError::InvalidInferPosition { name }
}
