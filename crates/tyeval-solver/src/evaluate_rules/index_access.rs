//! Indexed access evaluation: `T[K]`.
//!
//! Both sides are evaluated before the lookup. Key unions and target unions
//! distribute; an intersection target intersects the members that have the
//! key.

use tracing::trace;

use crate::diagnostics::{EvalResult, EvaluationError};
use crate::format::{format_js_number, literal_to_string};
use crate::normalize::{intersection_of, union_of};
use crate::relation::tuple_property;
use crate::types::*;

use super::super::evaluate::TypeEvaluator;

impl TypeEvaluator {
    pub(crate) fn evaluate_index_access(
        &self,
        target: &TypeValue,
        key: &TypeValue,
    ) -> EvalResult<TypeValue> {
        match key {
            TypeValue::Never => return Ok(TypeValue::Never),
            TypeValue::Union(keys) => {
                let mut results = Vec::with_capacity(keys.len());
                for key in keys {
                    results.push(self.evaluate_index_access(target, key)?);
                }
                return Ok(union_of(results));
            }
            _ => {}
        }

        match target {
            TypeValue::Any => Ok(TypeValue::Any),
            TypeValue::Never => Ok(TypeValue::Never),
            TypeValue::Union(members) => {
                let mut results = Vec::with_capacity(members.len());
                for member in members {
                    results.push(self.evaluate_index_access(member, key)?);
                }
                Ok(union_of(results))
            }
            TypeValue::Intersection(members) => {
                let found: Vec<TypeValue> = members
                    .iter()
                    .filter_map(|member| self.evaluate_index_access(member, key).ok())
                    .collect();
                if found.is_empty() {
                    return Err(no_such_field(target, key));
                }
                Ok(intersection_of(found))
            }
            TypeValue::Record(record) => self.index_record(record, target, key),
            TypeValue::Tuple(tuple) => self.index_tuple(tuple, target, key),
            _ => Err(no_such_field(target, key)),
        }
    }

    fn index_record(
        &self,
        record: &RecordType,
        target: &TypeValue,
        key: &TypeValue,
    ) -> EvalResult<TypeValue> {
        let field_name = match key {
            TypeValue::Literal(LiteralValue::String(name)) => name.to_string(),
            TypeValue::Literal(LiteralValue::Number(n)) => format_js_number(n.0),
            // `T[string]` reads every field.
            TypeValue::Primitive(PrimitiveKind::String) if !record.is_empty() => {
                return Ok(union_of(
                    record.fields.values().map(|field| field.type_value.clone()),
                ));
            }
            _ => return Err(no_such_field(target, key)),
        };
        match record.get(&field_name) {
            Some(field) => Ok(field.type_value.clone()),
            None => Err(no_such_field(target, key)),
        }
    }

    fn index_tuple(
        &self,
        tuple: &TupleType,
        target: &TypeValue,
        key: &TypeValue,
    ) -> EvalResult<TypeValue> {
        let found = match key {
            TypeValue::Literal(LiteralValue::Number(n)) => {
                let index = n.0;
                if index >= 0.0 && index.fract() == 0.0 {
                    tuple_property(tuple, &format_js_number(index))
                } else {
                    None
                }
            }
            TypeValue::Literal(LiteralValue::String(name)) => tuple_property(tuple, name),
            TypeValue::Primitive(PrimitiveKind::Number) => {
                trace!(
                    elements = tuple.elements.len(),
                    has_rest = tuple.rest.is_some(),
                    "index_tuple: element type union"
                );
                let elements = tuple.elements.iter().map(|e| e.type_value.clone());
                let value = union_of(elements.chain(tuple.rest.as_deref().cloned()));
                Some(value)
            }
            _ => None,
        };
        match found {
            Some(value) => Ok(value),
            None => Err(no_such_field(target, key)),
        }
    }
}

fn no_such_field(target: &TypeValue, key: &TypeValue) -> EvaluationError {
    let key = match key {
        TypeValue::Literal(literal) => literal_to_string(literal),
        other => other.to_string(),
    };
    EvaluationError::NoSuchField {
        key,
        target: target.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_lookup_distributes_over_key_union() {
        let evaluator = TypeEvaluator::new();
        let record = TypeValue::record([("a", TypeValue::NUMBER), ("b", TypeValue::STRING)]);
        let keys = TypeValue::union([TypeValue::literal_string("a"), TypeValue::literal_string("b")]);
        assert_eq!(
            evaluator.evaluate_index_access(&record, &keys).unwrap(),
            TypeValue::union([TypeValue::NUMBER, TypeValue::STRING])
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let evaluator = TypeEvaluator::new();
        let record = TypeValue::record([("a", TypeValue::NUMBER)]);
        let err = evaluator
            .evaluate_index_access(&record, &TypeValue::literal_string("z"))
            .unwrap_err();
        assert_eq!(
            err,
            EvaluationError::NoSuchField {
                key: "z".to_string(),
                target: "{ a: number }".to_string(),
            }
        );
    }

    #[test]
    fn tuple_index_length_and_number() {
        let evaluator = TypeEvaluator::new();
        let tuple = TypeValue::tuple(vec![TypeValue::literal_number(1.0), TypeValue::STRING]);
        assert_eq!(
            evaluator
                .evaluate_index_access(&tuple, &TypeValue::literal_number(1.0))
                .unwrap(),
            TypeValue::STRING
        );
        assert_eq!(
            evaluator
                .evaluate_index_access(&tuple, &TypeValue::literal_string("length"))
                .unwrap(),
            TypeValue::literal_number(2.0)
        );
        assert_eq!(
            evaluator.evaluate_index_access(&tuple, &TypeValue::NUMBER).unwrap(),
            TypeValue::union([TypeValue::literal_number(1.0), TypeValue::STRING])
        );
        assert!(
            evaluator
                .evaluate_index_access(&tuple, &TypeValue::literal_number(2.0))
                .is_err()
        );
    }

    #[test]
    fn intersection_target_uses_members_with_the_key() {
        let evaluator = TypeEvaluator::new();
        let target = TypeValue::Intersection(TypeList::new(vec![
            TypeValue::record([("a", TypeValue::STRING)]),
            TypeValue::tuple(vec![TypeValue::NUMBER]),
        ]));
        assert_eq!(
            evaluator
                .evaluate_index_access(&target, &TypeValue::literal_string("a"))
                .unwrap(),
            TypeValue::STRING
        );
    }
}
