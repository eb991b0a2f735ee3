//! Structural assignability.
//!
//! The matcher compares every pattern piece that captures nothing by asking
//! whether the subject is assignable to the evaluated piece. The rules cover
//! what `extends` needs for the closed value domain:
//!
//! - `never` is assignable to everything; everything is assignable to `any`
//!   and `unknown`; `any` is assignable to everything but `never`
//! - a union source needs every member assignable; a union target needs one
//! - literals widen to their primitive, `undefined` widens to `void`
//! - string literals fit template strings by hole-wise backtracking
//! - tuples and records use width subtyping with optional-element rules
//! - function parameters are contravariant, returns covariant

use crate::format::literal_to_string;
use crate::types::*;

/// `source extends target` over normalized values.
pub fn is_assignable(source: &TypeValue, target: &TypeValue) -> bool {
    if source == target {
        return true;
    }
    match (source, target) {
        (_, TypeValue::Any | TypeValue::Unknown) | (TypeValue::Never, _) => return true,
        (_, TypeValue::Never) | (TypeValue::Unknown, _) => return false,
        (TypeValue::Any, _) => return true,
        _ => {}
    }

    if let TypeValue::Union(members) = source {
        return members.iter().all(|member| is_assignable(member, target));
    }
    if let TypeValue::Intersection(members) = target {
        return members.iter().all(|member| is_assignable(source, member));
    }
    if let TypeValue::Union(members) = target {
        if members.iter().any(|member| is_assignable(source, member)) {
            return true;
        }
        // `boolean` is `true | false`.
        if matches!(source, TypeValue::Primitive(PrimitiveKind::Boolean)) {
            return is_assignable(&TypeValue::literal_bool(true), target)
                && is_assignable(&TypeValue::literal_bool(false), target);
        }
        return false;
    }
    if let TypeValue::Intersection(members) = source {
        return members.iter().any(|member| is_assignable(member, target));
    }

    match (source, target) {
        (TypeValue::Literal(literal), TypeValue::Primitive(kind)) => literal.base_kind() == *kind,
        (TypeValue::Literal(LiteralValue::String(text)), TypeValue::TemplateString(spans)) => {
            text_fits_template(text, spans)
        }
        (TypeValue::TemplateString(_), TypeValue::Primitive(PrimitiveKind::String)) => true,
        (
            TypeValue::Primitive(PrimitiveKind::Undefined),
            TypeValue::Primitive(PrimitiveKind::Void),
        ) => true,
        (TypeValue::Tuple(s), TypeValue::Tuple(t)) => is_tuple_assignable(s, t),
        (TypeValue::Record(s), TypeValue::Record(t)) => is_record_assignable(s, t),
        (TypeValue::Tuple(s), TypeValue::Record(t)) => t.fields.iter().all(|(name, field)| {
            match tuple_property(s, name) {
                Some(value) => is_assignable(&value, &field.type_value),
                None => field.optional,
            }
        }),
        (TypeValue::Function(s), TypeValue::Function(t)) => is_function_assignable(s, t),
        // `{}`-like targets accept every non-nullish value.
        (
            TypeValue::Literal(_)
            | TypeValue::Primitive(
                PrimitiveKind::String
                | PrimitiveKind::Number
                | PrimitiveKind::Boolean
                | PrimitiveKind::BigInt
                | PrimitiveKind::Symbol,
            )
            | TypeValue::TemplateString(_)
            | TypeValue::Function(_),
            TypeValue::Record(t),
        ) => t.fields.values().all(|field| field.optional),
        _ => false,
    }
}

fn is_tuple_assignable(source: &TupleType, target: &TupleType) -> bool {
    let len = source.elements.len().max(target.elements.len());
    for index in 0..len {
        let target_slot = target
            .elements
            .get(index)
            .map(|e| (&e.type_value, e.optional))
            .or_else(|| target.rest.as_deref().map(|rest| (rest, true)));
        match (source.elements.get(index), target_slot) {
            (Some(element), Some((target_type, target_optional))) => {
                if element.optional && !target_optional {
                    return false;
                }
                if !is_assignable(&element.type_value, target_type) {
                    return false;
                }
            }
            // Source is longer than the target allows.
            (Some(_), None) => return false,
            (None, Some((target_type, target_optional))) => {
                if !target_optional {
                    return false;
                }
                if let Some(rest) = source.rest.as_deref()
                    && !is_assignable(rest, target_type)
                {
                    return false;
                }
            }
            (None, None) => {}
        }
    }
    match (source.rest.as_deref(), target.rest.as_deref()) {
        (Some(source_rest), Some(target_rest)) => is_assignable(source_rest, target_rest),
        (Some(_), None) => false,
        _ => true,
    }
}

fn is_record_assignable(source: &RecordType, target: &RecordType) -> bool {
    target
        .fields
        .iter()
        .all(|(name, target_field)| match source.get(name) {
            Some(source_field) => {
                (!source_field.optional || target_field.optional)
                    && is_assignable(&source_field.type_value, &target_field.type_value)
            }
            None => target_field.optional,
        })
}

fn is_function_assignable(source: &FunctionType, target: &FunctionType) -> bool {
    for (index, source_param) in source.params.iter().enumerate() {
        let target_param = match target.params.get(index).or(target.rest.as_deref()) {
            Some(param) => param,
            None => return false,
        };
        if !is_assignable(target_param, source_param) {
            return false;
        }
    }
    if let Some(source_rest) = source.rest.as_deref() {
        let extra = target.params.iter().skip(source.params.len());
        for target_param in extra.chain(target.rest.as_deref()) {
            if !is_assignable(target_param, source_rest) {
                return false;
            }
        }
    }
    matches!(*target.returns, TypeValue::Primitive(PrimitiveKind::Void))
        || is_assignable(&source.returns, &target.returns)
}

/// The type of `tuple[name]` when `name` is `length` or an index.
pub(crate) fn tuple_property(tuple: &TupleType, name: &str) -> Option<TypeValue> {
    if name == "length" {
        return Some(tuple_length(tuple));
    }
    let index: usize = name.parse().ok()?;
    if index.to_string() != name {
        return None;
    }
    match tuple.elements.get(index) {
        Some(element) => Some(element.type_value.clone()),
        None => tuple.rest.as_deref().cloned(),
    }
}

/// `T["length"]`: a literal for fixed tuples, a union of the possible lengths
/// with optional elements, and `number` with a rest element.
pub(crate) fn tuple_length(tuple: &TupleType) -> TypeValue {
    if tuple.rest.is_some() {
        return TypeValue::NUMBER;
    }
    let required = tuple.required_count();
    TypeValue::union((required..=tuple.elements.len()).map(|n| TypeValue::literal_number(n as f64)))
}

// =============================================================================
// Template strings
// =============================================================================

/// Whether `text` is one of the strings denoted by the template `spans`.
pub fn text_fits_template(text: &str, spans: &[TemplateSpan]) -> bool {
    let Some((first, rest)) = spans.split_first() else {
        return text.is_empty();
    };
    match first {
        TemplateSpan::Text(prefix) => text
            .strip_prefix(prefix.as_ref())
            .is_some_and(|remaining| text_fits_template(remaining, rest)),
        TemplateSpan::Type(hole) => {
            // Last hole takes everything; otherwise try every split point.
            if rest.is_empty() {
                return text_fits_hole(text, hole);
            }
            text.char_indices()
                .map(|(i, _)| i)
                .chain(std::iter::once(text.len()))
                .any(|split| {
                    text_fits_hole(&text[..split], hole) && text_fits_template(&text[split..], rest)
                })
        }
    }
}

/// Whether `text` is a string representation of a value of type `hole`.
pub fn text_fits_hole(text: &str, hole: &TypeValue) -> bool {
    match hole {
        TypeValue::Any | TypeValue::Primitive(PrimitiveKind::String) => true,
        TypeValue::Primitive(PrimitiveKind::Number) => is_numeric_text(text),
        TypeValue::Primitive(PrimitiveKind::BigInt) => {
            let digits = text.strip_prefix('-').unwrap_or(text);
            !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
        }
        TypeValue::Primitive(PrimitiveKind::Boolean) => text == "true" || text == "false",
        TypeValue::Primitive(PrimitiveKind::Null) => text == "null",
        TypeValue::Primitive(PrimitiveKind::Undefined) => text == "undefined",
        TypeValue::Literal(literal) => text == literal_to_string(literal),
        TypeValue::Union(members) => members.iter().any(|member| text_fits_hole(text, member)),
        TypeValue::Intersection(members) => {
            members.iter().all(|member| text_fits_hole(text, member))
        }
        TypeValue::TemplateString(spans) => text_fits_template(text, spans),
        _ => false,
    }
}

/// Text accepted by a `${number}` hole: a finite number with no surrounding whitespace.
pub(crate) fn is_numeric_text(text: &str) -> bool {
    !text.is_empty()
        && text.trim() == text
        && text
            .bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'))
        && text.parse::<f64>().is_ok_and(f64::is_finite)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(s: &str) -> TypeValue {
        TypeValue::literal_string(s)
    }

    fn num(n: f64) -> TypeValue {
        TypeValue::literal_number(n)
    }

    #[test]
    fn top_and_bottom() {
        assert!(is_assignable(&TypeValue::Never, &TypeValue::STRING));
        assert!(is_assignable(&TypeValue::STRING, &TypeValue::Unknown));
        assert!(is_assignable(&TypeValue::Any, &TypeValue::STRING));
        assert!(!is_assignable(&TypeValue::Any, &TypeValue::Never));
        assert!(!is_assignable(&TypeValue::Unknown, &TypeValue::STRING));
    }

    #[test]
    fn literal_widens_but_primitive_does_not_narrow() {
        assert!(is_assignable(&lit("a"), &TypeValue::STRING));
        assert!(!is_assignable(&TypeValue::STRING, &lit("a")));
        assert!(!is_assignable(&num(1.0), &TypeValue::STRING));
    }

    #[test]
    fn unions_on_both_sides() {
        let ab = TypeValue::union([lit("a"), lit("b")]);
        let abc = TypeValue::union([lit("a"), lit("b"), lit("c")]);
        assert!(is_assignable(&ab, &abc));
        assert!(!is_assignable(&abc, &ab));
        let bools = TypeValue::union([TypeValue::literal_bool(true), TypeValue::literal_bool(false)]);
        assert!(is_assignable(&TypeValue::BOOLEAN, &bools));
    }

    #[test]
    fn record_width_subtyping() {
        let wide = TypeValue::record([("a", TypeValue::STRING), ("b", TypeValue::NUMBER)]);
        let narrow = TypeValue::record([("a", TypeValue::STRING)]);
        assert!(is_assignable(&wide, &narrow));
        assert!(!is_assignable(&narrow, &wide));
    }

    #[test]
    fn optional_field_needs_optional_target() {
        let optional = TypeValue::Record(
            RecordType::new().with_field("a", FieldInfo::new(TypeValue::STRING).with_optional(true)),
        );
        let required = TypeValue::record([("a", TypeValue::STRING)]);
        assert!(!is_assignable(&optional, &required));
        assert!(is_assignable(&required, &optional));
    }

    #[test]
    fn tuple_arity_and_rest() {
        let pair = TypeValue::tuple(vec![num(1.0), num(2.0)]);
        let numbers = TypeValue::Tuple(TupleType::new(vec![], Some(TypeValue::NUMBER)));
        assert!(is_assignable(&pair, &numbers));
        assert!(!is_assignable(&numbers, &pair));
        assert!(!is_assignable(&pair, &TypeValue::tuple(vec![num(1.0)])));
        let with_optional = TypeValue::Tuple(TupleType::new(
            vec![
                TupleElement::required(TypeValue::NUMBER),
                TupleElement::optional(TypeValue::NUMBER),
                TupleElement::optional(TypeValue::NUMBER),
            ],
            None,
        ));
        assert!(is_assignable(&pair, &with_optional));
    }

    #[test]
    fn function_variance() {
        let takes_string = TypeValue::function(vec![TypeValue::STRING], TypeValue::NUMBER);
        let takes_literal = TypeValue::function(vec![lit("a")], TypeValue::NUMBER);
        assert!(is_assignable(&takes_string, &takes_literal));
        assert!(!is_assignable(&takes_literal, &takes_string));
        let nullary = TypeValue::function(vec![], num(1.0));
        assert!(is_assignable(&nullary, &takes_string));
        let returns_void = TypeValue::function(vec![], TypeValue::VOID);
        assert!(is_assignable(&takes_string, &TypeValue::function(vec![TypeValue::STRING], TypeValue::VOID)));
        assert!(!is_assignable(&takes_string, &returns_void));
    }

    #[test]
    fn template_holes() {
        let spans = vec![
            TemplateSpan::Text(Name::from("id-")),
            TemplateSpan::Type(TypeValue::NUMBER),
        ];
        assert!(text_fits_template("id-42", &spans));
        assert!(text_fits_template("id-1.5", &spans));
        assert!(!text_fits_template("id-", &spans));
        assert!(!text_fits_template("id-x", &spans));
        assert!(!text_fits_template("id- 1", &spans));
        let template = TypeValue::TemplateString(spans);
        assert!(is_assignable(&lit("id-7"), &template));
        assert!(is_assignable(&template, &TypeValue::STRING));
    }

    #[test]
    fn template_backtracks_over_string_holes() {
        let spans = vec![
            TemplateSpan::Type(TypeValue::STRING),
            TemplateSpan::Text(Name::from(".")),
            TemplateSpan::Type(TypeValue::STRING),
        ];
        assert!(text_fits_template("a.b.c", &spans));
        assert!(!text_fits_template("abc", &spans));
    }

    #[test]
    fn tuple_length_shapes() {
        let fixed = TupleType::new(vec![TupleElement::required(TypeValue::STRING)], None);
        assert_eq!(tuple_length(&fixed), num(1.0));
        let optional = TupleType::new(
            vec![
                TupleElement::required(TypeValue::STRING),
                TupleElement::optional(TypeValue::STRING),
            ],
            None,
        );
        assert_eq!(tuple_length(&optional), TypeValue::union([num(1.0), num(2.0)]));
        let open = TupleType::new(vec![], Some(TypeValue::STRING));
        assert_eq!(tuple_length(&open), TypeValue::NUMBER);
    }
}
