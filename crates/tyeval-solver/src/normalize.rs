//! Canonical forms for type values.
//!
//! Every value handed out by the evaluator goes through these constructors,
//! so no evaluation rule ever observes a nested or duplicated union.
//!
//! Union rules:
//! - nested unions are flattened, duplicates dropped (first occurrence wins)
//! - `any` / `unknown` absorb every other member
//! - `never` is removed; the empty union is `never`
//! - a literal is absorbed by its own primitive (`"a" | string` is `string`)
//!
//! Intersection rules:
//! - nested intersections are flattened, `unknown` is the identity
//! - `never` wins, then `any`
//! - intersections distribute over union members
//! - disjoint primitives or literals collapse to `never`
//! - all record members merge into a single record

use indexmap::IndexMap;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::format::literal_to_string;
use crate::types::*;

/// Return the canonical form of `value`.
///
/// Total and idempotent: `normalize(&normalize(v)) == normalize(v)`.
pub fn normalize(value: &TypeValue) -> TypeValue {
    match value {
        TypeValue::Never
        | TypeValue::Unknown
        | TypeValue::Any
        | TypeValue::Literal(_)
        | TypeValue::Primitive(_) => value.clone(),
        TypeValue::Tuple(tuple) => normalize_tuple(tuple),
        TypeValue::Record(record) => TypeValue::Record(RecordType {
            fields: record
                .fields
                .iter()
                .map(|(name, field)| {
                    (
                        name.clone(),
                        FieldInfo {
                            type_value: normalize(&field.type_value),
                            optional: field.optional,
                            readonly: field.readonly,
                        },
                    )
                })
                .collect(),
        }),
        TypeValue::Union(members) => union_of(members.iter().map(normalize)),
        TypeValue::Intersection(members) => intersection_of(members.iter().map(normalize)),
        TypeValue::Function(function) => normalize_function(function),
        TypeValue::TemplateString(spans) => template_string_of(spans.iter().map(|span| match span {
            TemplateSpan::Text(text) => TemplateSpan::Text(text.clone()),
            TemplateSpan::Type(hole) => TemplateSpan::Type(normalize(hole)),
        })),
    }
}

/// Structural equality: equality of normalized forms.
pub fn structurally_equal(a: &TypeValue, b: &TypeValue) -> bool {
    normalize(a) == normalize(b)
}

/// `rest` is an element type, so a tuple-valued rest is an array of tuples
/// and stays as it is. Splicing `...[b, c]` happens when expressions are
/// evaluated, not here.
fn normalize_tuple(tuple: &TupleType) -> TypeValue {
    let elements: Vec<TupleElement> = tuple
        .elements
        .iter()
        .map(|element| TupleElement {
            type_value: normalize(&element.type_value),
            optional: element.optional,
        })
        .collect();
    // `...never[]` has no elements.
    let rest = tuple
        .rest
        .as_deref()
        .map(normalize)
        .filter(|rest| !rest.is_never());
    TypeValue::Tuple(TupleType::new(elements, rest))
}

fn normalize_function(function: &FunctionType) -> TypeValue {
    TypeValue::Function(FunctionType {
        params: function.params.iter().map(normalize).collect(),
        rest: function.rest.as_deref().map(|rest| Box::new(normalize(rest))),
        returns: Box::new(normalize(&function.returns)),
    })
}

/// Build a normalized union. Members are expected to be normalized already.
pub fn union_of(members: impl IntoIterator<Item = TypeValue>) -> TypeValue {
    let mut flat: Vec<TypeValue> = Vec::new();
    for member in members {
        match member {
            TypeValue::Union(inner) => flat.extend(inner.into_vec()),
            other => flat.push(other),
        }
    }

    if flat.iter().any(TypeValue::is_any) {
        return TypeValue::Any;
    }
    if flat.iter().any(|m| matches!(m, TypeValue::Unknown)) {
        return TypeValue::Unknown;
    }

    let primitives: SmallVec<[PrimitiveKind; 4]> = flat
        .iter()
        .filter_map(|m| match m {
            TypeValue::Primitive(kind) => Some(*kind),
            _ => None,
        })
        .collect();

    let mut seen: FxHashSet<TypeValue> = FxHashSet::default();
    let mut result: Vec<TypeValue> = Vec::with_capacity(flat.len());
    for member in flat {
        let absorbed = match &member {
            TypeValue::Never => true,
            TypeValue::Literal(literal) => primitives.contains(&literal.base_kind()),
            TypeValue::TemplateString(_) => primitives.contains(&PrimitiveKind::String),
            _ => false,
        };
        if absorbed || !seen.insert(member.clone()) {
            continue;
        }
        result.push(member);
    }

    match result.len() {
        0 => TypeValue::Never,
        1 => result.pop().unwrap_or(TypeValue::Never),
        _ => TypeValue::Union(TypeList::new(result)),
    }
}

/// Build a normalized intersection. Members are expected to be normalized already.
pub fn intersection_of(members: impl IntoIterator<Item = TypeValue>) -> TypeValue {
    let mut flat: Vec<TypeValue> = Vec::new();
    for member in members {
        match member {
            TypeValue::Intersection(inner) => flat.extend(inner.into_vec()),
            TypeValue::Unknown => {}
            other => flat.push(other),
        }
    }

    if flat.iter().any(TypeValue::is_never) {
        return TypeValue::Never;
    }
    if flat.iter().any(TypeValue::is_any) {
        return TypeValue::Any;
    }

    // (A | B) & C  ==>  (A & C) | (B & C)
    // Unions fold in one at a time and each partial result is normalized, so
    // disjoint pairs drop out before the next union multiplies them.
    if flat.iter().any(|m| matches!(m, TypeValue::Union(_))) {
        let (unions, rest): (Vec<TypeValue>, Vec<TypeValue>) = flat
            .into_iter()
            .partition(|m| matches!(m, TypeValue::Union(_)));
        let mut folded = intersection_of(rest);
        for union in unions {
            if folded.is_never() {
                break;
            }
            trace!(
                left = folded.union_members().len(),
                alternatives = union.union_members().len(),
                "intersection_of: distributing over union member"
            );
            let mut distributed =
                Vec::with_capacity(folded.union_members().len() * union.union_members().len());
            for left in folded.union_members() {
                for alternative in union.union_members() {
                    distributed.push(intersection_of([left.clone(), alternative.clone()]));
                }
            }
            folded = union_of(distributed);
        }
        return folded;
    }

    let mut seen: FxHashSet<TypeValue> = FxHashSet::default();
    let mut atoms: Vec<TypeValue> = Vec::with_capacity(flat.len());
    let mut merged_record: Option<RecordType> = None;
    for member in flat {
        if !seen.insert(member.clone()) {
            continue;
        }
        match member {
            TypeValue::Record(record) => match merged_record.as_mut() {
                Some(merged) => *merged = merge_record_members(merged, &record),
                None => {
                    merged_record = Some(record);
                    // Placeholder keeps the record's position among members.
                    atoms.push(TypeValue::Unknown);
                }
            },
            other => atoms.push(other),
        }
    }

    if has_disjoint_atoms(&atoms) {
        return TypeValue::Never;
    }

    // A literal is narrower than its own primitive.
    let literal_kinds: SmallVec<[PrimitiveKind; 4]> = atoms
        .iter()
        .filter_map(|m| match m {
            TypeValue::Literal(literal) => Some(literal.base_kind()),
            TypeValue::TemplateString(_) => Some(PrimitiveKind::String),
            _ => None,
        })
        .collect();
    atoms.retain(|m| match m {
        TypeValue::Primitive(kind) => !literal_kinds.contains(kind),
        _ => true,
    });

    if let Some(record) = merged_record {
        match atoms.iter().position(|m| matches!(m, TypeValue::Unknown)) {
            Some(position) => atoms[position] = TypeValue::Record(record),
            None => atoms.push(TypeValue::Record(record)),
        }
    }

    match atoms.len() {
        0 => TypeValue::Unknown,
        1 => atoms.pop().unwrap_or(TypeValue::Unknown),
        _ => TypeValue::Intersection(TypeList::new(atoms)),
    }
}

/// Two different literals, or primitives of different kinds, share no values.
fn has_disjoint_atoms(atoms: &[TypeValue]) -> bool {
    let mut literal: Option<&LiteralValue> = None;
    let mut primitive: Option<PrimitiveKind> = None;
    for atom in atoms {
        match atom {
            TypeValue::Literal(value) => {
                if literal.is_some_and(|existing| existing != value) {
                    return true;
                }
                literal = Some(value);
            }
            TypeValue::Primitive(kind) => {
                if primitive.is_some_and(|existing| existing != *kind) {
                    return true;
                }
                primitive = Some(*kind);
            }
            _ => {}
        }
    }
    match (literal, primitive) {
        (Some(value), Some(kind)) => value.base_kind() != kind,
        _ => false,
    }
}

/// Merge two records that are members of the same intersection.
fn merge_record_members(left: &RecordType, right: &RecordType) -> RecordType {
    let mut fields: IndexMap<Name, FieldInfo> = left.fields.clone();
    for (name, field) in &right.fields {
        match fields.get_mut(name) {
            Some(existing) => {
                existing.type_value =
                    intersection_of([existing.type_value.clone(), field.type_value.clone()]);
                existing.optional = existing.optional && field.optional;
                existing.readonly = existing.readonly || field.readonly;
            }
            None => {
                fields.insert(name.clone(), field.clone());
            }
        }
    }
    RecordType { fields }
}

/// Build a normalized template string: literal holes become text, adjacent
/// text merges, and a template without holes is a string literal.
pub fn template_string_of(spans: impl IntoIterator<Item = TemplateSpan>) -> TypeValue {
    let mut result: Vec<TemplateSpan> = Vec::new();
    let mut pending = String::new();
    for span in spans {
        match span {
            TemplateSpan::Text(text) => pending.push_str(&text),
            TemplateSpan::Type(TypeValue::Literal(literal)) => {
                pending.push_str(&literal_to_string(&literal));
            }
            TemplateSpan::Type(TypeValue::Never) => return TypeValue::Never,
            TemplateSpan::Type(TypeValue::TemplateString(inner)) => {
                for inner_span in inner {
                    match inner_span {
                        TemplateSpan::Text(text) => pending.push_str(&text),
                        hole => {
                            if !pending.is_empty() {
                                result.push(TemplateSpan::Text(Name::from(pending.as_str())));
                                pending.clear();
                            }
                            result.push(hole);
                        }
                    }
                }
            }
            hole => {
                if !pending.is_empty() {
                    result.push(TemplateSpan::Text(Name::from(pending.as_str())));
                    pending.clear();
                }
                result.push(hole);
            }
        }
    }
    if result.is_empty() {
        return TypeValue::literal_string(&pending);
    }
    if !pending.is_empty() {
        result.push(TemplateSpan::Text(Name::from(pending.as_str())));
    }
    if let [TemplateSpan::Type(TypeValue::Primitive(PrimitiveKind::String))] = result.as_slice() {
        return TypeValue::STRING;
    }
    TypeValue::TemplateString(result)
}
