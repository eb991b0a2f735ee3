//! Type value representation.
//!
//! `TypeValue` is the closed domain every evaluation step operates over.
//! Values are immutable and compared structurally:
//!
//! - Union and intersection members compare as sets
//! - Record fields compare as maps (declaration order is kept for iteration)
//! - Number literals compare by canonical bit pattern (`-0` equals `0`)
//!
//! `Hash` is implemented consistently with that equality so values can key
//! memo tables directly.

use indexmap::IndexMap;
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::normalize::{intersection_of, union_of};

/// Identifier used for type parameters, definitions, fields and infer names.
pub type Name = Arc<str>;

/// `f64` wrapper with total equality and hashing for number literals.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderedFloat(pub f64);

impl OrderedFloat {
    fn canonical_bits(self) -> u64 {
        if self.0 == 0.0 {
            0.0f64.to_bits()
        } else if self.0.is_nan() {
            f64::NAN.to_bits()
        } else {
            self.0.to_bits()
        }
    }
}

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_bits() == other.canonical_bits()
    }
}

impl Eq for OrderedFloat {}

impl Hash for OrderedFloat {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_bits().hash(state);
    }
}

/// Primitive (non-literal) base types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveKind {
    String,
    Number,
    Boolean,
    BigInt,
    Symbol,
    Null,
    Undefined,
    Void,
}

impl PrimitiveKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::BigInt => "bigint",
            Self::Symbol => "symbol",
            Self::Null => "null",
            Self::Undefined => "undefined",
            Self::Void => "void",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "string" => Self::String,
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "bigint" => Self::BigInt,
            "symbol" => Self::Symbol,
            "null" => Self::Null,
            "undefined" => Self::Undefined,
            "void" => Self::Void,
            _ => return None,
        })
    }
}

/// Exact literal values.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LiteralValue {
    String(Name),
    Number(OrderedFloat),
    Boolean(bool),
}

impl LiteralValue {
    /// The primitive a literal widens to.
    pub const fn base_kind(&self) -> PrimitiveKind {
        match self {
            Self::String(_) => PrimitiveKind::String,
            Self::Number(_) => PrimitiveKind::Number,
            Self::Boolean(_) => PrimitiveKind::Boolean,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleElement {
    pub type_value: TypeValue,
    #[serde(default)]
    pub optional: bool,
}

impl TupleElement {
    pub fn required(type_value: TypeValue) -> Self {
        Self {
            type_value,
            optional: false,
        }
    }

    pub fn optional(type_value: TypeValue) -> Self {
        Self {
            type_value,
            optional: true,
        }
    }
}

/// Fixed-arity positional type with an optional variadic tail.
///
/// `rest` holds the *element* type of the tail: `[string, ...number[]]` has
/// `rest = Some(number)`, and `[string, ...[number, number][]]` has a tuple
/// as its rest. Spreading a tuple into its neighbours is done by the
/// evaluator on expressions, never on values.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TupleType {
    pub elements: Vec<TupleElement>,
    #[serde(default)]
    pub rest: Option<Box<TypeValue>>,
}

impl TupleType {
    pub fn new(elements: Vec<TupleElement>, rest: Option<TypeValue>) -> Self {
        Self {
            elements,
            rest: rest.map(Box::new),
        }
    }

    pub fn required_count(&self) -> usize {
        self.elements.iter().filter(|e| !e.optional).count()
    }

    /// Whether every instance of this tuple has the same length.
    pub fn is_fixed_length(&self) -> bool {
        self.rest.is_none() && self.elements.iter().all(|e| !e.optional)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldInfo {
    pub type_value: TypeValue,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub readonly: bool,
}

impl FieldInfo {
    pub fn new(type_value: TypeValue) -> Self {
        Self {
            type_value,
            optional: false,
            readonly: false,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }
}

/// Object type with named fields.
///
/// Equality ignores field order; iteration follows insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordType {
    pub fields: IndexMap<Name, FieldInfo>,
}

impl RecordType {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, field: FieldInfo) -> Self {
        self.fields.insert(Name::from(name), field);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.get(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field-wise union of two records; fields of `other` win on conflict.
    pub fn merge(&self, other: &RecordType) -> RecordType {
        let mut fields = self.fields.clone();
        for (name, field) in &other.fields {
            fields.insert(name.clone(), field.clone());
        }
        RecordType { fields }
    }
}

impl Hash for RecordType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fields.len().hash(state);
        let mut combined: u64 = 0;
        for (name, field) in &self.fields {
            let mut hasher = FxHasher::default();
            name.hash(&mut hasher);
            field.hash(&mut hasher);
            combined = combined.wrapping_add(hasher.finish());
        }
        combined.hash(state);
    }
}

/// Member list of a union or intersection.
///
/// Compared as a set. Member order is first-occurrence order and only
/// matters for display and deterministic iteration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeList(Vec<TypeValue>);

impl TypeList {
    pub fn new(members: Vec<TypeValue>) -> Self {
        Self(members)
    }

    pub fn members(&self) -> &[TypeValue] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TypeValue> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &TypeValue) -> bool {
        self.0.contains(value)
    }

    pub fn into_vec(self) -> Vec<TypeValue> {
        self.0
    }
}

impl PartialEq for TypeList {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().all(|member| other.0.contains(member))
            && other.0.iter().all(|member| self.0.contains(member))
    }
}

impl Eq for TypeList {}

impl Hash for TypeList {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.len().hash(state);
        let mut combined: u64 = 0;
        for member in &self.0 {
            let mut hasher = FxHasher::default();
            member.hash(&mut hasher);
            combined = combined.wrapping_add(hasher.finish());
        }
        combined.hash(state);
    }
}

impl<'a> IntoIterator for &'a TypeList {
    type Item = &'a TypeValue;
    type IntoIter = std::slice::Iter<'a, TypeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FunctionType {
    pub params: Vec<TypeValue>,
    /// Element type of a trailing `...rest` parameter.
    #[serde(default)]
    pub rest: Option<Box<TypeValue>>,
    pub returns: Box<TypeValue>,
}

/// One segment of a template string type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateSpan {
    Text(Name),
    Type(TypeValue),
}

/// The runtime value of every type computation.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeValue {
    Never,
    Unknown,
    Any,
    Literal(LiteralValue),
    Primitive(PrimitiveKind),
    Tuple(TupleType),
    Record(RecordType),
    Union(TypeList),
    Intersection(TypeList),
    Function(FunctionType),
    TemplateString(Vec<TemplateSpan>),
}

impl TypeValue {
    pub const STRING: TypeValue = TypeValue::Primitive(PrimitiveKind::String);
    pub const NUMBER: TypeValue = TypeValue::Primitive(PrimitiveKind::Number);
    pub const BOOLEAN: TypeValue = TypeValue::Primitive(PrimitiveKind::Boolean);
    pub const UNDEFINED: TypeValue = TypeValue::Primitive(PrimitiveKind::Undefined);
    pub const VOID: TypeValue = TypeValue::Primitive(PrimitiveKind::Void);

    pub fn literal_string(value: &str) -> Self {
        Self::Literal(LiteralValue::String(Name::from(value)))
    }

    pub fn literal_number(value: f64) -> Self {
        Self::Literal(LiteralValue::Number(OrderedFloat(value)))
    }

    pub fn literal_bool(value: bool) -> Self {
        Self::Literal(LiteralValue::Boolean(value))
    }

    /// Fixed tuple of required elements.
    pub fn tuple(elements: Vec<TypeValue>) -> Self {
        Self::Tuple(TupleType::new(
            elements.into_iter().map(TupleElement::required).collect(),
            None,
        ))
    }

    /// Record of required, mutable fields.
    pub fn record<'n>(fields: impl IntoIterator<Item = (&'n str, TypeValue)>) -> Self {
        Self::Record(RecordType {
            fields: fields
                .into_iter()
                .map(|(name, value)| (Name::from(name), FieldInfo::new(value)))
                .collect(),
        })
    }

    pub fn function(params: Vec<TypeValue>, returns: TypeValue) -> Self {
        Self::Function(FunctionType {
            params,
            rest: None,
            returns: Box::new(returns),
        })
    }

    /// Normalized union of `members`.
    pub fn union(members: impl IntoIterator<Item = TypeValue>) -> Self {
        union_of(members)
    }

    /// Normalized intersection of `members`.
    pub fn intersection(members: impl IntoIterator<Item = TypeValue>) -> Self {
        intersection_of(members)
    }

    #[inline]
    pub fn is_never(&self) -> bool {
        matches!(self, Self::Never)
    }

    #[inline]
    pub fn is_any(&self) -> bool {
        matches!(self, Self::Any)
    }

    pub fn as_string_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(LiteralValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_number_literal(&self) -> Option<f64> {
        match self {
            Self::Literal(LiteralValue::Number(n)) => Some(n.0),
            _ => None,
        }
    }

    /// Members of a union, or the value itself as a single member.
    pub fn union_members(&self) -> &[TypeValue] {
        match self {
            Self::Union(members) => members.members(),
            other => std::slice::from_ref(other),
        }
    }
}

impl From<LiteralValue> for TypeValue {
    fn from(value: LiteralValue) -> Self {
        Self::Literal(value)
    }
}

impl From<PrimitiveKind> for TypeValue {
    fn from(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }
}
