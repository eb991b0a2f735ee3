//! Expression AST.
//!
//! An `Expression` is the declarative program for one type computation. It is
//! built once and evaluated any number of times under different environments.
//! `Infer` nodes are binders and are only meaningful inside the `pattern` of a
//! `Conditional`.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::types::{LiteralValue, Name, OrderedFloat, PrimitiveKind, TypeValue};

/// `+readonly` / `-readonly` (and `?`) modifiers of a mapped type.
///
/// `None` at the use site keeps the modifier of the source field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MappedModifier {
    Add,
    Remove,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StringIntrinsicKind {
    Uppercase,
    Lowercase,
    Capitalize,
    Uncapitalize,
}

impl StringIntrinsicKind {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uppercase => "Uppercase",
            Self::Lowercase => "Lowercase",
            Self::Capitalize => "Capitalize",
            Self::Uncapitalize => "Uncapitalize",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectFieldExpr {
    pub name: Name,
    pub value: Expression,
    #[serde(default)]
    pub optional: bool,
    #[serde(default)]
    pub readonly: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TupleElementExpr {
    pub value: Expression,
    #[serde(default)]
    pub optional: bool,
    /// `...value`: a tuple splices in place, anything else becomes the rest element type.
    #[serde(default)]
    pub spread: bool,
}

impl TupleElementExpr {
    pub fn required(value: Expression) -> Self {
        Self {
            value,
            optional: false,
            spread: false,
        }
    }

    pub fn optional(value: Expression) -> Self {
        Self {
            value,
            optional: true,
            spread: false,
        }
    }

    pub fn spread(value: Expression) -> Self {
        Self {
            value,
            optional: false,
            spread: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TupleExpr {
    pub elements: Vec<TupleElementExpr>,
    /// Trailing variadic tail; equivalent to a final spread element.
    #[serde(default)]
    pub rest: Option<Box<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConditionalExpr {
    pub check: Expression,
    pub pattern: Expression,
    pub then_branch: Expression,
    pub else_branch: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InferExpr {
    pub name: Name,
    /// `infer N extends C`
    #[serde(default)]
    pub constraint: Option<Box<Expression>>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MappedExpr {
    /// The per-key binder (`P` in `[P in keyof T]`).
    pub key_name: Name,
    pub source_keys: Expression,
    pub value: Expression,
    /// `as` clause.
    #[serde(default)]
    pub key_remap: Option<Expression>,
    #[serde(default)]
    pub readonly_modifier: Option<MappedModifier>,
    #[serde(default)]
    pub optional_modifier: Option<MappedModifier>,
}

impl MappedExpr {
    pub fn new(key_name: &str, source_keys: Expression, value: Expression) -> Self {
        Self {
            key_name: Name::from(key_name),
            source_keys,
            value,
            key_remap: None,
            readonly_modifier: None,
            optional_modifier: None,
        }
    }

    pub fn with_key_remap(mut self, remap: Expression) -> Self {
        self.key_remap = Some(remap);
        self
    }

    pub fn with_readonly(mut self, modifier: MappedModifier) -> Self {
        self.readonly_modifier = Some(modifier);
        self
    }

    pub fn with_optional(mut self, modifier: MappedModifier) -> Self {
        self.optional_modifier = Some(modifier);
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TemplatePart {
    Text(Name),
    Hole(Expression),
}

impl TemplatePart {
    pub fn text(text: &str) -> Self {
        Self::Text(Name::from(text))
    }

    pub fn hole(expr: Expression) -> Self {
        Self::Hole(expr)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FunctionExpr {
    pub params: Vec<Expression>,
    /// Type of the whole rest parameter list (`...args: P`), normally a tuple.
    #[serde(default)]
    pub rest: Option<Expression>,
    pub returns: Expression,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    Ref(Name),
    Lit(TypeValue),
    Object(Vec<ObjectFieldExpr>),
    Tuple(TupleExpr),
    Union(Vec<Expression>),
    Intersection(Vec<Expression>),
    Conditional(Box<ConditionalExpr>),
    Infer(InferExpr),
    IndexedAccess(Box<Expression>, Box<Expression>),
    Keyof(Box<Expression>),
    Mapped(Box<MappedExpr>),
    TemplateLiteral(Vec<TemplatePart>),
    Apply(Name, Vec<Expression>),
    Function(Box<FunctionExpr>),
    StringIntrinsic(StringIntrinsicKind, Box<Expression>),
}

// =============================================================================
// Constructors
// =============================================================================

impl Expression {
    pub fn reference(name: &str) -> Self {
        Self::Ref(Name::from(name))
    }

    pub fn lit(value: TypeValue) -> Self {
        Self::Lit(value)
    }

    pub fn lit_str(value: &str) -> Self {
        Self::Lit(TypeValue::literal_string(value))
    }

    pub fn lit_num(value: f64) -> Self {
        Self::Lit(TypeValue::Literal(LiteralValue::Number(OrderedFloat(value))))
    }

    pub fn lit_bool(value: bool) -> Self {
        Self::Lit(TypeValue::literal_bool(value))
    }

    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Lit(TypeValue::Primitive(kind))
    }

    pub fn never() -> Self {
        Self::Lit(TypeValue::Never)
    }

    pub fn infer(name: &str) -> Self {
        Self::Infer(InferExpr {
            name: Name::from(name),
            constraint: None,
        })
    }

    pub fn infer_extends(name: &str, constraint: Expression) -> Self {
        Self::Infer(InferExpr {
            name: Name::from(name),
            constraint: Some(Box::new(constraint)),
        })
    }

    pub fn conditional(
        check: Expression,
        pattern: Expression,
        then_branch: Expression,
        else_branch: Expression,
    ) -> Self {
        Self::Conditional(Box::new(ConditionalExpr {
            check,
            pattern,
            then_branch,
            else_branch,
        }))
    }

    pub fn apply(name: &str, args: Vec<Expression>) -> Self {
        Self::Apply(Name::from(name), args)
    }

    pub fn indexed(target: Expression, key: Expression) -> Self {
        Self::IndexedAccess(Box::new(target), Box::new(key))
    }

    pub fn keyof(target: Expression) -> Self {
        Self::Keyof(Box::new(target))
    }

    /// Object of required, mutable fields.
    pub fn object<'n>(fields: impl IntoIterator<Item = (&'n str, Expression)>) -> Self {
        Self::Object(
            fields
                .into_iter()
                .map(|(name, value)| ObjectFieldExpr {
                    name: Name::from(name),
                    value,
                    optional: false,
                    readonly: false,
                })
                .collect(),
        )
    }

    /// Tuple of required elements.
    pub fn tuple(elements: Vec<Expression>) -> Self {
        Self::Tuple(TupleExpr {
            elements: elements.into_iter().map(TupleElementExpr::required).collect(),
            rest: None,
        })
    }

    pub fn tuple_with(elements: Vec<TupleElementExpr>, rest: Option<Expression>) -> Self {
        Self::Tuple(TupleExpr {
            elements,
            rest: rest.map(Box::new),
        })
    }

    pub fn union(members: Vec<Expression>) -> Self {
        Self::Union(members)
    }

    pub fn intersection(members: Vec<Expression>) -> Self {
        Self::Intersection(members)
    }

    pub fn template(parts: Vec<TemplatePart>) -> Self {
        Self::TemplateLiteral(parts)
    }

    pub fn mapped(mapped: MappedExpr) -> Self {
        Self::Mapped(Box::new(mapped))
    }

    pub fn function(params: Vec<Expression>, returns: Expression) -> Self {
        Self::Function(Box::new(FunctionExpr {
            params,
            rest: None,
            returns,
        }))
    }

    /// `(...args: rest) => returns`
    pub fn function_rest(params: Vec<Expression>, rest: Expression, returns: Expression) -> Self {
        Self::Function(Box::new(FunctionExpr {
            params,
            rest: Some(rest),
            returns,
        }))
    }

    pub fn string_intrinsic(kind: StringIntrinsicKind, arg: Expression) -> Self {
        Self::StringIntrinsic(kind, Box::new(arg))
    }
}

// =============================================================================
// Queries
// =============================================================================

impl Expression {
    /// The parameter name if this is a bare `Ref` (a naked type parameter).
    pub fn as_naked_ref(&self) -> Option<&Name> {
        match self {
            Self::Ref(name) => Some(name),
            _ => None,
        }
    }

    /// Whether an `Infer` binder owned by the enclosing pattern occurs here.
    ///
    /// Binders inside a nested conditional's own pattern belong to that
    /// conditional and are not counted.
    pub fn contains_infer(&self) -> bool {
        match self {
            Self::Infer(_) => true,
            Self::Ref(_) | Self::Lit(_) => false,
            Self::Object(fields) => fields.iter().any(|f| f.value.contains_infer()),
            Self::Tuple(tuple) => {
                tuple.elements.iter().any(|e| e.value.contains_infer())
                    || tuple.rest.as_deref().is_some_and(Self::contains_infer)
            }
            Self::Union(members) | Self::Intersection(members) | Self::Apply(_, members) => {
                members.iter().any(Self::contains_infer)
            }
            Self::Conditional(cond) => {
                cond.check.contains_infer()
                    || cond.then_branch.contains_infer()
                    || cond.else_branch.contains_infer()
            }
            Self::IndexedAccess(target, key) => target.contains_infer() || key.contains_infer(),
            Self::Keyof(inner) | Self::StringIntrinsic(_, inner) => inner.contains_infer(),
            Self::Mapped(mapped) => {
                mapped.source_keys.contains_infer()
                    || mapped.value.contains_infer()
                    || mapped.key_remap.as_ref().is_some_and(Self::contains_infer)
            }
            Self::TemplateLiteral(parts) => parts.iter().any(|part| match part {
                TemplatePart::Text(_) => false,
                TemplatePart::Hole(hole) => hole.contains_infer(),
            }),
            Self::Function(function) => {
                function.params.iter().any(Self::contains_infer)
                    || function.rest.as_ref().is_some_and(Self::contains_infer)
                    || function.returns.contains_infer()
            }
        }
    }

    /// Names of every `Infer` binder owned by this pattern, first occurrence first.
    pub fn infer_names(&self) -> Vec<Name> {
        let mut names = Vec::new();
        self.collect_infer_names(&mut names);
        names
    }

    fn collect_infer_names(&self, out: &mut Vec<Name>) {
        match self {
            Self::Infer(infer) => {
                if !out.contains(&infer.name) {
                    out.push(infer.name.clone());
                }
            }
            Self::Ref(_) | Self::Lit(_) => {}
            Self::Object(fields) => {
                for field in fields {
                    field.value.collect_infer_names(out);
                }
            }
            Self::Tuple(tuple) => {
                for element in &tuple.elements {
                    element.value.collect_infer_names(out);
                }
                if let Some(rest) = &tuple.rest {
                    rest.collect_infer_names(out);
                }
            }
            Self::Union(members) | Self::Intersection(members) | Self::Apply(_, members) => {
                for member in members {
                    member.collect_infer_names(out);
                }
            }
            Self::Conditional(cond) => {
                cond.check.collect_infer_names(out);
                cond.then_branch.collect_infer_names(out);
                cond.else_branch.collect_infer_names(out);
            }
            Self::IndexedAccess(target, key) => {
                target.collect_infer_names(out);
                key.collect_infer_names(out);
            }
            Self::Keyof(inner) | Self::StringIntrinsic(_, inner) => inner.collect_infer_names(out),
            Self::Mapped(mapped) => {
                mapped.source_keys.collect_infer_names(out);
                mapped.value.collect_infer_names(out);
                if let Some(remap) = &mapped.key_remap {
                    remap.collect_infer_names(out);
                }
            }
            Self::TemplateLiteral(parts) => {
                for part in parts {
                    if let TemplatePart::Hole(hole) = part {
                        hole.collect_infer_names(out);
                    }
                }
            }
            Self::Function(function) => {
                for param in &function.params {
                    param.collect_infer_names(out);
                }
                if let Some(rest) = &function.rest {
                    rest.collect_infer_names(out);
                }
                function.returns.collect_infer_names(out);
            }
        }
    }

    /// Every name used by a `Ref` anywhere in this expression, bound or free.
    pub fn referenced_names(&self) -> Vec<Name> {
        let mut names = Vec::new();
        self.collect_referenced_names(&mut names);
        names
    }

    fn collect_referenced_names(&self, out: &mut Vec<Name>) {
        match self {
            Self::Ref(name) => {
                if !out.contains(name) {
                    out.push(name.clone());
                }
            }
            Self::Lit(_) => {}
            Self::Infer(infer) => {
                if let Some(constraint) = &infer.constraint {
                    constraint.collect_referenced_names(out);
                }
            }
            Self::Object(fields) => {
                for field in fields {
                    field.value.collect_referenced_names(out);
                }
            }
            Self::Tuple(tuple) => {
                for element in &tuple.elements {
                    element.value.collect_referenced_names(out);
                }
                if let Some(rest) = &tuple.rest {
                    rest.collect_referenced_names(out);
                }
            }
            Self::Union(members) | Self::Intersection(members) | Self::Apply(_, members) => {
                for member in members {
                    member.collect_referenced_names(out);
                }
            }
            Self::Conditional(cond) => {
                cond.check.collect_referenced_names(out);
                cond.pattern.collect_referenced_names(out);
                cond.then_branch.collect_referenced_names(out);
                cond.else_branch.collect_referenced_names(out);
            }
            Self::IndexedAccess(target, key) => {
                target.collect_referenced_names(out);
                key.collect_referenced_names(out);
            }
            Self::Keyof(inner) | Self::StringIntrinsic(_, inner) => {
                inner.collect_referenced_names(out);
            }
            Self::Mapped(mapped) => {
                mapped.source_keys.collect_referenced_names(out);
                mapped.value.collect_referenced_names(out);
                if let Some(remap) = &mapped.key_remap {
                    remap.collect_referenced_names(out);
                }
            }
            Self::TemplateLiteral(parts) => {
                for part in parts {
                    if let TemplatePart::Hole(hole) = part {
                        hole.collect_referenced_names(out);
                    }
                }
            }
            Self::Function(function) => {
                for param in &function.params {
                    param.collect_referenced_names(out);
                }
                if let Some(rest) = &function.rest {
                    rest.collect_referenced_names(out);
                }
                function.returns.collect_referenced_names(out);
            }
        }
    }

    /// Replace free `Ref`s named in `replacements`.
    ///
    /// Binders shadow: a mapped type's key name inside its value and remap,
    /// and a conditional's inferred names inside its then-branch.
    pub fn substitute(&self, replacements: &FxHashMap<Name, Expression>) -> Expression {
        if replacements.is_empty() {
            return self.clone();
        }
        let sub = |expr: &Expression| expr.substitute(replacements);
        match self {
            Self::Ref(name) => match replacements.get(name) {
                Some(replacement) => replacement.clone(),
                None => self.clone(),
            },
            Self::Lit(_) => self.clone(),
            Self::Infer(infer) => Self::Infer(InferExpr {
                name: infer.name.clone(),
                constraint: infer.constraint.as_deref().map(|c| Box::new(sub(c))),
            }),
            Self::Object(fields) => Self::Object(
                fields
                    .iter()
                    .map(|f| ObjectFieldExpr {
                        name: f.name.clone(),
                        value: sub(&f.value),
                        optional: f.optional,
                        readonly: f.readonly,
                    })
                    .collect(),
            ),
            Self::Tuple(tuple) => Self::Tuple(TupleExpr {
                elements: tuple
                    .elements
                    .iter()
                    .map(|e| TupleElementExpr {
                        value: sub(&e.value),
                        optional: e.optional,
                        spread: e.spread,
                    })
                    .collect(),
                rest: tuple.rest.as_deref().map(|r| Box::new(sub(r))),
            }),
            Self::Union(members) => Self::Union(members.iter().map(sub).collect()),
            Self::Intersection(members) => Self::Intersection(members.iter().map(sub).collect()),
            Self::Apply(name, args) => Self::Apply(name.clone(), args.iter().map(sub).collect()),
            Self::Conditional(cond) => {
                let bound = cond.pattern.infer_names();
                let then_branch = if bound.iter().any(|n| replacements.contains_key(n)) {
                    let mut narrowed = replacements.clone();
                    for name in &bound {
                        narrowed.remove(name);
                    }
                    cond.then_branch.substitute(&narrowed)
                } else {
                    sub(&cond.then_branch)
                };
                Self::conditional(
                    sub(&cond.check),
                    sub(&cond.pattern),
                    then_branch,
                    sub(&cond.else_branch),
                )
            }
            Self::IndexedAccess(target, key) => Self::indexed(sub(target), sub(key)),
            Self::Keyof(inner) => Self::keyof(sub(inner)),
            Self::StringIntrinsic(kind, inner) => Self::string_intrinsic(*kind, sub(inner)),
            Self::Mapped(mapped) => {
                let shadowed;
                let inner = if replacements.contains_key(&mapped.key_name) {
                    let mut narrowed = replacements.clone();
                    narrowed.remove(&mapped.key_name);
                    shadowed = narrowed;
                    &shadowed
                } else {
                    replacements
                };
                Self::Mapped(Box::new(MappedExpr {
                    key_name: mapped.key_name.clone(),
                    source_keys: sub(&mapped.source_keys),
                    value: mapped.value.substitute(inner),
                    key_remap: mapped.key_remap.as_ref().map(|r| r.substitute(inner)),
                    readonly_modifier: mapped.readonly_modifier,
                    optional_modifier: mapped.optional_modifier,
                }))
            }
            Self::TemplateLiteral(parts) => Self::TemplateLiteral(
                parts
                    .iter()
                    .map(|part| match part {
                        TemplatePart::Text(text) => TemplatePart::Text(text.clone()),
                        TemplatePart::Hole(hole) => TemplatePart::Hole(sub(hole)),
                    })
                    .collect(),
            ),
            Self::Function(function) => Self::Function(Box::new(FunctionExpr {
                params: function.params.iter().map(sub).collect(),
                rest: function.rest.as_ref().map(sub),
                returns: sub(&function.returns),
            })),
        }
    }
}

impl From<TypeValue> for Expression {
    fn from(value: TypeValue) -> Self {
        Self::Lit(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infer_names_skip_nested_conditional_patterns() {
        let nested = Expression::conditional(
            Expression::reference("X"),
            Expression::infer("Inner"),
            Expression::reference("Inner"),
            Expression::never(),
        );
        let pattern = Expression::tuple(vec![Expression::infer("H"), nested]);
        assert_eq!(pattern.infer_names(), vec![Name::from("H")]);
        assert!(pattern.contains_infer());
    }

    #[test]
    fn substitute_respects_mapped_key_shadowing() {
        let mut replacements = FxHashMap::default();
        replacements.insert(Name::from("P"), Expression::lit_str("outer"));
        replacements.insert(Name::from("T"), Expression::lit_str("source"));
        let mapped = Expression::mapped(MappedExpr::new(
            "P",
            Expression::keyof(Expression::reference("T")),
            Expression::indexed(Expression::reference("T"), Expression::reference("P")),
        ));
        let Expression::Mapped(result) = mapped.substitute(&replacements) else {
            panic!("expected mapped expression");
        };
        assert_eq!(
            result.source_keys,
            Expression::keyof(Expression::lit_str("source"))
        );
        assert_eq!(
            result.value,
            Expression::indexed(Expression::lit_str("source"), Expression::reference("P"))
        );
    }

    #[test]
    fn referenced_names_cover_constraints_and_patterns() {
        let expr = Expression::conditional(
            Expression::reference("T"),
            Expression::infer_extends("X", Expression::reference("Bound")),
            Expression::tuple(vec![Expression::reference("X"), Expression::reference("T")]),
            Expression::never(),
        );
        assert_eq!(
            expr.referenced_names(),
            vec![Name::from("T"), Name::from("Bound"), Name::from("X")]
        );
    }

    #[test]
    fn substitute_respects_infer_shadowing() {
        let mut replacements = FxHashMap::default();
        replacements.insert(Name::from("R"), Expression::lit_num(1.0));
        let cond = Expression::conditional(
            Expression::reference("R"),
            Expression::infer("R"),
            Expression::reference("R"),
            Expression::reference("R"),
        );
        let Expression::Conditional(result) = cond.substitute(&replacements) else {
            panic!("expected conditional");
        };
        assert_eq!(result.check, Expression::lit_num(1.0));
        assert_eq!(result.then_branch, Expression::reference("R"));
        assert_eq!(result.else_branch, Expression::lit_num(1.0));
    }

    #[test]
    fn serde_shape_is_externally_tagged() {
        let expr = Expression::apply("Pick", vec![Expression::reference("T")]);
        let json = serde_json::to_string(&expr).unwrap();
        assert_eq!(json, r#"{"Apply":["Pick",[{"Ref":"T"}]]}"#);
        let back: Expression = serde_json::from_str(&json).unwrap();
        assert_eq!(back, expr);
    }
}
