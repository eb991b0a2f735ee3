//! Mapped type evaluation: `{ [P in K as R]: V }`.
//!
//! Keys are iterated in the order of the evaluated key set. Each key gets a
//! fresh scope binding `P`, in which the value and the optional key remap
//! are evaluated.
//!
//! A mapping is homomorphic when it iterates `keyof T`, or when its value
//! reads `T[P]`. Homomorphic mappings start from the modifiers of the source
//! field, and over a tuple (without `as`) they produce a tuple.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::diagnostics::{EvalResult, EvaluationError};
use crate::env::Environment;
use crate::expr::{Expression, MappedExpr, MappedModifier};
use crate::format::format_js_number;
use crate::normalize::union_of;
use crate::types::*;

use super::super::evaluate::TypeEvaluator;

impl TypeEvaluator {
    pub(crate) fn evaluate_mapped(
        &mut self,
        mapped: &MappedExpr,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        // `keyof T` with `T` bound to a union maps each member separately.
        if let Expression::Keyof(inner) = &mapped.source_keys
            && let Some(name) = inner.as_naked_ref()
            && let Some(bound) = env.lookup(name)
        {
            match bound {
                TypeValue::Union(members) => {
                    trace!(param = %name, members = members.len(), "evaluate_mapped: distributing");
                    let members = members.members().to_vec();
                    let mut results = Vec::with_capacity(members.len());
                    for member in members {
                        let mut single = FxHashMap::default();
                        single.insert(name.clone(), member);
                        results.push(self.evaluate_mapped(mapped, &env.child(single))?);
                    }
                    return Ok(union_of(results));
                }
                TypeValue::Never | TypeValue::Literal(_) | TypeValue::Primitive(_) => {
                    return Ok(bound.clone());
                }
                _ => {}
            }
        }

        let (source, keys) = match &mapped.source_keys {
            Expression::Keyof(inner) => {
                let source = self.evaluate_in(inner, env)?;
                let keys = self.evaluate_keyof(&source);
                (Some(source), keys)
            }
            source_keys => {
                let keys = self.evaluate_in(source_keys, env)?;
                let source = match &mapped.value {
                    Expression::IndexedAccess(target, key)
                        if key.as_naked_ref() == Some(&mapped.key_name) =>
                    {
                        Some(self.evaluate_in(target, env)?)
                    }
                    _ => None,
                };
                (source, keys)
            }
        };

        if let Some(TypeValue::Tuple(tuple)) = &source
            && mapped.key_remap.is_none()
            && matches!(mapped.source_keys, Expression::Keyof(_))
        {
            return self.map_tuple(mapped, tuple, env);
        }

        let source_record = match &source {
            Some(TypeValue::Record(record)) => Some(record),
            _ => None,
        };

        let mut fields: IndexMap<Name, FieldInfo> = IndexMap::new();
        if keys.is_never() {
            return Ok(TypeValue::Record(RecordType { fields }));
        }
        for key in keys.union_members() {
            let key_name = property_name(key)?;
            let key_env = bind_key(env, &mapped.key_name, key.clone());
            let type_value = self.evaluate_in(&mapped.value, &key_env)?;

            let names = match &mapped.key_remap {
                Some(remap) => {
                    let remapped = self.evaluate_in(remap, &key_env)?;
                    if remapped.is_never() {
                        trace!(key = %key_name, "evaluate_mapped: key dropped by remap");
                        continue;
                    }
                    remapped
                        .union_members()
                        .iter()
                        .map(property_name)
                        .collect::<EvalResult<Vec<_>>>()?
                }
                None => vec![key_name.clone()],
            };

            let source_field = source_record.and_then(|record| record.get(&key_name));
            let optional = apply_modifier(
                mapped.optional_modifier,
                source_field.is_some_and(|f| f.optional),
            );
            let readonly = apply_modifier(
                mapped.readonly_modifier,
                source_field.is_some_and(|f| f.readonly),
            );

            for name in names {
                match fields.get_mut(&name) {
                    // Several keys remapped onto one name.
                    Some(existing) => {
                        existing.type_value =
                            union_of([existing.type_value.clone(), type_value.clone()]);
                        existing.optional |= optional;
                        existing.readonly |= readonly;
                    }
                    None => {
                        fields.insert(
                            name,
                            FieldInfo {
                                type_value: type_value.clone(),
                                optional,
                                readonly,
                            },
                        );
                    }
                }
            }
        }

        Ok(TypeValue::Record(RecordType { fields }))
    }

    /// `{ [I in keyof T]: V }` over a tuple maps each element.
    fn map_tuple(
        &mut self,
        mapped: &MappedExpr,
        tuple: &TupleType,
        env: &Environment<'_>,
    ) -> EvalResult<TypeValue> {
        let mut elements = Vec::with_capacity(tuple.elements.len());
        for (index, element) in tuple.elements.iter().enumerate() {
            let key_env = bind_key(env, &mapped.key_name, TypeValue::literal_number(index as f64));
            let type_value = self.evaluate_in(&mapped.value, &key_env)?;
            elements.push(TupleElement {
                type_value,
                optional: apply_modifier(mapped.optional_modifier, element.optional),
            });
        }
        let rest = match &tuple.rest {
            Some(_) => {
                let key_env = bind_key(env, &mapped.key_name, TypeValue::NUMBER);
                Some(self.evaluate_in(&mapped.value, &key_env)?)
            }
            None => None,
        };
        Ok(TypeValue::Tuple(TupleType::new(elements, rest)))
    }
}

fn bind_key<'a>(env: &Environment<'a>, key_name: &Name, key: TypeValue) -> Environment<'a> {
    let mut single = FxHashMap::default();
    single.insert(key_name.clone(), key);
    env.child(single)
}

fn apply_modifier(modifier: Option<MappedModifier>, inherited: bool) -> bool {
    match modifier {
        Some(MappedModifier::Add) => true,
        Some(MappedModifier::Remove) => false,
        None => inherited,
    }
}

/// Field name for a key value: string and number literals only.
fn property_name(key: &TypeValue) -> EvalResult<Name> {
    match key {
        TypeValue::Literal(LiteralValue::String(name)) => Ok(name.clone()),
        TypeValue::Literal(LiteralValue::Number(n)) => Ok(Name::from(format_js_number(n.0))),
        other => Err(EvaluationError::InvalidKey {
            key: other.to_string(),
        }),
    }
}
