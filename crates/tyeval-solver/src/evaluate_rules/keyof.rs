//! keyof operator evaluation.
//!
//! Handles the keyof operator: `keyof T`

use indexmap::IndexSet;
use tracing::trace;

use crate::normalize::{intersection_of, union_of};
use crate::types::*;

use super::super::evaluate::TypeEvaluator;

impl TypeEvaluator {
    /// Keys of an evaluated value, as a union of key literals.
    ///
    /// - record: field names in stored order
    /// - tuple: element indices, plus `number` with a rest element
    /// - union: the keys common to every member
    /// - intersection: the keys of any member
    /// - `any` and `never`: `string | number | symbol`
    pub(crate) fn evaluate_keyof(&self, value: &TypeValue) -> TypeValue {
        match value {
            TypeValue::Record(record) => union_of(
                record
                    .fields
                    .keys()
                    .map(|name| TypeValue::literal_string(name)),
            ),
            TypeValue::Tuple(tuple) => {
                let indices = (0..tuple.elements.len()).map(|i| TypeValue::literal_number(i as f64));
                union_of(indices.chain(tuple.rest.as_ref().map(|_| TypeValue::NUMBER)))
            }
            TypeValue::Union(members) => {
                trace!(members = members.len(), "evaluate_keyof: common keys of union");
                self.common_keys(members)
            }
            TypeValue::Intersection(members) => {
                union_of(members.iter().map(|member| self.evaluate_keyof(member)))
            }
            TypeValue::Any | TypeValue::Never => union_of([
                TypeValue::STRING,
                TypeValue::NUMBER,
                TypeValue::Primitive(PrimitiveKind::Symbol),
            ]),
            _ => TypeValue::Never,
        }
    }

    /// Keys present in every member, in the first member's order.
    ///
    /// Folds one member at a time over an ordered key set, so the work is
    /// bounded by members times key pairs.
    fn common_keys(&self, members: &TypeList) -> TypeValue {
        let mut common: Option<IndexSet<TypeValue>> = None;
        for member in members {
            let keys = self.evaluate_keyof(member);
            let keys = keys.union_members().iter().filter(|key| !key.is_never());
            common = Some(match common {
                None => keys.cloned().collect(),
                Some(previous) => {
                    let keys: Vec<&TypeValue> = keys.collect();
                    let mut next = IndexSet::with_capacity(previous.len());
                    for key in previous {
                        for other in &keys {
                            let shared = if key == **other {
                                key.clone()
                            } else {
                                intersection_of([key.clone(), (*other).clone()])
                            };
                            if !shared.is_never() {
                                next.insert(shared);
                            }
                        }
                    }
                    next
                }
            });
            if common.as_ref().is_some_and(IndexSet::is_empty) {
                break;
            }
        }
        union_of(common.unwrap_or_default())
    }
}
