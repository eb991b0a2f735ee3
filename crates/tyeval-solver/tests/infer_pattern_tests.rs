//! Tests for structural pattern matching with `infer`.

use super::*;
use rustc_hash::FxHashMap;

fn lit(s: &str) -> TypeValue {
    TypeValue::literal_string(s)
}

fn num(n: f64) -> TypeValue {
    TypeValue::literal_number(n)
}

fn match_value(subject: &TypeValue, pattern: &Expression) -> MatchOutcome {
    let store = DefinitionStore::new();
    let env = Environment::new(&store);
    TypeEvaluator::new().match_pattern(subject, pattern, &env).unwrap()
}

fn bindings(pairs: &[(&str, TypeValue)]) -> FxHashMap<Name, TypeValue> {
    pairs
        .iter()
        .map(|(name, value)| (Name::from(*name), value.clone()))
        .collect()
}

fn head_tail() -> Expression {
    Expression::tuple_with(
        vec![
            TupleElementExpr::required(Expression::infer("H")),
            TupleElementExpr::spread(Expression::infer("R")),
        ],
        None,
    )
}

// =============================================================================
// Tuples
// =============================================================================

#[test]
fn test_head_tail_split() {
    let subject = TypeValue::tuple(vec![num(1.0), num(2.0), num(3.0)]);
    assert_eq!(
        match_value(&subject, &head_tail()),
        MatchOutcome::Matched(bindings(&[
            ("H", num(1.0)),
            ("R", TypeValue::tuple(vec![num(2.0), num(3.0)])),
        ]))
    );
}

#[test]
fn test_empty_tuple_against_head_tail_is_failure_not_error() {
    assert_eq!(
        match_value(&TypeValue::tuple(vec![]), &head_tail()),
        MatchOutcome::Failed
    );
}

#[test]
fn test_prefix_variadic_suffix() {
    // [1, 2, 3, 4] extends [infer A, ...infer M, infer Z]
    let pattern = Expression::tuple_with(
        vec![
            TupleElementExpr::required(Expression::infer("A")),
            TupleElementExpr::spread(Expression::infer("M")),
            TupleElementExpr::required(Expression::infer("Z")),
        ],
        None,
    );
    let subject = TypeValue::tuple(vec![num(1.0), num(2.0), num(3.0), num(4.0)]);
    assert_eq!(
        match_value(&subject, &pattern),
        MatchOutcome::Matched(bindings(&[
            ("A", num(1.0)),
            ("M", TypeValue::tuple(vec![num(2.0), num(3.0)])),
            ("Z", num(4.0)),
        ]))
    );
}

#[test]
fn test_two_variadic_elements_are_ambiguous() {
    let pattern = Expression::tuple_with(
        vec![
            TupleElementExpr::spread(Expression::infer("A")),
            TupleElementExpr::spread(Expression::infer("B")),
        ],
        None,
    );
    let subject = TypeValue::tuple(vec![num(1.0), num(2.0)]);
    assert!(matches!(match_value(&subject, &pattern), MatchOutcome::Ambiguous(_)));
}

#[test]
fn test_fixed_pattern_rejects_longer_subject() {
    let pattern = Expression::tuple(vec![Expression::infer("A")]);
    let subject = TypeValue::tuple(vec![num(1.0), num(2.0)]);
    assert_eq!(match_value(&subject, &pattern), MatchOutcome::Failed);
}

#[test]
fn test_missing_optional_element_binds_unknown() {
    let pattern = Expression::tuple_with(
        vec![
            TupleElementExpr::required(Expression::infer("A")),
            TupleElementExpr::optional(Expression::infer("B")),
        ],
        None,
    );
    let subject = TypeValue::tuple(vec![lit("x")]);
    assert_eq!(
        match_value(&subject, &pattern),
        MatchOutcome::Matched(bindings(&[("A", lit("x")), ("B", TypeValue::Unknown)]))
    );
}

#[test]
fn test_open_subject_captures_rest() {
    // [string, ...number[]] extends [infer H, ...infer R] → R = number[]
    let subject = TypeValue::Tuple(TupleType::new(
        vec![TupleElement::required(TypeValue::STRING)],
        Some(TypeValue::NUMBER),
    ));
    assert_eq!(
        match_value(&subject, &head_tail()),
        MatchOutcome::Matched(bindings(&[
            ("H", TypeValue::STRING),
            ("R", TypeValue::Tuple(TupleType::new(vec![], Some(TypeValue::NUMBER)))),
        ]))
    );
}

// =============================================================================
// Objects and functions
// =============================================================================

#[test]
fn test_object_pattern_ignores_extra_fields() {
    let subject = TypeValue::record([
        ("id", num(7.0)),
        ("name", TypeValue::STRING),
        ("extra", TypeValue::BOOLEAN),
    ]);
    let pattern = Expression::object([("id", Expression::infer("I")), ("name", Expression::infer("N"))]);
    assert_eq!(
        match_value(&subject, &pattern),
        MatchOutcome::Matched(bindings(&[("I", num(7.0)), ("N", TypeValue::STRING)]))
    );
}

#[test]
fn test_object_pattern_requires_field() {
    let subject = TypeValue::record([("id", num(7.0))]);
    let pattern = Expression::object([("name", Expression::infer("N"))]);
    assert_eq!(match_value(&subject, &pattern), MatchOutcome::Failed);
}

#[test]
fn test_function_params_and_return() {
    let subject = TypeValue::function(vec![TypeValue::STRING, TypeValue::NUMBER], TypeValue::BOOLEAN);
    let pattern = Expression::function_rest(
        vec![Expression::infer("First")],
        Expression::infer("Rest"),
        Expression::infer("R"),
    );
    assert_eq!(
        match_value(&subject, &pattern),
        MatchOutcome::Matched(bindings(&[
            ("First", TypeValue::STRING),
            ("Rest", TypeValue::tuple(vec![TypeValue::NUMBER])),
            ("R", TypeValue::BOOLEAN),
        ]))
    );
}

#[test]
fn test_contravariant_captures_intersect() {
    // ((a: {x: 1}) => void) | ((a: {y: 2}) => void) extends (a: infer I) => void
    let left = TypeValue::function(vec![TypeValue::record([("x", num(1.0))])], TypeValue::VOID);
    let right = TypeValue::function(vec![TypeValue::record([("y", num(2.0))])], TypeValue::VOID);
    let pattern = Expression::function(
        vec![Expression::infer("I")],
        Expression::primitive(PrimitiveKind::Void),
    );
    assert_eq!(
        match_value(&TypeValue::union([left, right]), &pattern),
        MatchOutcome::Matched(bindings(&[(
            "I",
            TypeValue::record([("x", num(1.0)), ("y", num(2.0))])
        )]))
    );
}

#[test]
fn test_covariant_captures_union() {
    // [1] | [2] extends [infer X] → X = 1 | 2
    let subject = TypeValue::union([
        TypeValue::tuple(vec![num(1.0)]),
        TypeValue::tuple(vec![num(2.0)]),
    ]);
    let pattern = Expression::tuple(vec![Expression::infer("X")]);
    assert_eq!(
        match_value(&subject, &pattern),
        MatchOutcome::Matched(bindings(&[("X", TypeValue::union([num(1.0), num(2.0)]))]))
    );
}

// =============================================================================
// Constraints, unions and applications
// =============================================================================

#[test]
fn test_infer_constraint_filters() {
    let pattern = Expression::tuple(vec![Expression::infer_extends(
        "S",
        Expression::primitive(PrimitiveKind::String),
    )]);
    assert_eq!(
        match_value(&TypeValue::tuple(vec![num(1.0)]), &pattern),
        MatchOutcome::Failed
    );
    assert_eq!(
        match_value(&TypeValue::tuple(vec![lit("a")]), &pattern),
        MatchOutcome::Matched(bindings(&[("S", lit("a"))]))
    );
}

#[test]
fn test_union_pattern_first_member_wins() {
    let pattern = Expression::union(vec![
        Expression::tuple(vec![Expression::infer("A")]),
        Expression::tuple(vec![Expression::infer("A"), Expression::infer("B")]),
    ]);
    assert_eq!(
        match_value(&TypeValue::tuple(vec![num(1.0), num(2.0)]), &pattern),
        MatchOutcome::Matched(bindings(&[("A", num(1.0)), ("B", num(2.0))]))
    );
    // Names the winning member does not capture are unknown.
    assert_eq!(
        match_value(&TypeValue::tuple(vec![num(1.0)]), &pattern),
        MatchOutcome::Matched(bindings(&[("A", num(1.0)), ("B", TypeValue::Unknown)]))
    );
}

#[test]
fn test_application_in_pattern_is_expanded() {
    // Box<T> = { value: T };  { value: string } extends Box<infer X> → X = string
    let store = DefinitionStore::new();
    store.define_type("Box", &["T"], Expression::object([("value", Expression::reference("T"))]));
    let env = Environment::new(&store);
    let subject = TypeValue::record([("value", TypeValue::STRING)]);
    let pattern = Expression::apply("Box", vec![Expression::infer("X")]);
    assert_eq!(
        TypeEvaluator::new().match_pattern(&subject, &pattern, &env).unwrap(),
        MatchOutcome::Matched(bindings(&[("X", TypeValue::STRING)]))
    );
}

#[test]
fn test_expanded_body_does_not_see_caller_parameters() {
    // Tag = "box";  Box<T> = { value: T; tag: Tag }
    // Unbox<Tag, S> = S extends Box<infer V> ? V : never
    // Unbox<"other", { value: number; tag: "box" }> → number
    let store = DefinitionStore::new();
    store.define_type("Tag", &[], Expression::lit_str("box"));
    store.define_type(
        "Box",
        &["T"],
        Expression::object([
            ("value", Expression::reference("T")),
            ("tag", Expression::reference("Tag")),
        ]),
    );
    store.define_type(
        "Unbox",
        &["Tag", "S"],
        Expression::conditional(
            Expression::reference("S"),
            Expression::apply("Box", vec![Expression::infer("V")]),
            Expression::reference("V"),
            Expression::never(),
        ),
    );
    let env = Environment::new(&store);
    let subject = TypeValue::record([("value", TypeValue::NUMBER), ("tag", lit("box"))]);
    let expr = Expression::apply(
        "Unbox",
        vec![Expression::lit_str("other"), Expression::lit(subject)],
    );
    assert_eq!(evaluate(&expr, &env).unwrap(), TypeValue::NUMBER);
}

#[test]
fn test_pattern_arguments_resolve_in_caller_scope() {
    // With a local Tag = "other", Box<[infer V, Tag]> reads the local in the
    // argument and the global `Tag = "box"` in the body.
    let store = DefinitionStore::new();
    store.define_type("Tag", &[], Expression::lit_str("box"));
    store.define_type(
        "Box",
        &["T"],
        Expression::object([
            ("value", Expression::reference("T")),
            ("tag", Expression::reference("Tag")),
        ]),
    );
    let env = Environment::new(&store);
    let local = env.child(bindings(&[("Tag", lit("other"))]));
    let subject = TypeValue::record([
        ("value", TypeValue::tuple(vec![num(1.0), lit("other")])),
        ("tag", lit("box")),
    ]);
    let pattern = Expression::apply(
        "Box",
        vec![Expression::tuple(vec![Expression::infer("V"), Expression::reference("Tag")])],
    );
    assert_eq!(
        TypeEvaluator::new().match_pattern(&subject, &pattern, &local).unwrap(),
        MatchOutcome::Matched(bindings(&[("V", num(1.0))]))
    );
}

#[test]
fn test_infer_under_keyof_is_rejected() {
    let store = DefinitionStore::new();
    let env = Environment::new(&store);
    let pattern = Expression::keyof(Expression::infer("K"));
    let err = TypeEvaluator::new()
        .match_pattern(&TypeValue::STRING, &pattern, &env)
        .unwrap_err();
    assert_eq!(
        err,
        EvaluationError::InvalidInferPosition {
            name: Name::from("K")
        }
    );
}

#[test]
fn test_never_subject_binds_every_name() {
    assert_eq!(
        match_value(&TypeValue::Never, &head_tail()),
        MatchOutcome::Matched(bindings(&[("H", TypeValue::Never), ("R", TypeValue::Never)]))
    );
}
