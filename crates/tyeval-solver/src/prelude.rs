//! Utility definitions expressed in the evaluator's own algebra.
//!
//! `register_prelude` installs the usual mapped, conditional and recursive
//! utilities (`Pick`, `Omit`, `Partial`, `ReturnType`, `Reverse`,
//! `Permutation`, `UnionToIntersection`, ...) into a definition store.
//! Existing definitions with the same names are overwritten.

use tracing::debug;

use crate::def::{DefinitionInfo, DefinitionStore, TypeParamInfo};
use crate::expr::{
    Expression, MappedExpr, MappedModifier, StringIntrinsicKind, TemplatePart, TupleElementExpr,
};
use crate::types::{PrimitiveKind, TupleType, TypeValue};

fn r(name: &str) -> Expression {
    Expression::reference(name)
}

fn apply(name: &str, args: Vec<Expression>) -> Expression {
    Expression::apply(name, args)
}

/// `T[P]`
fn index(target: &str, key: &str) -> Expression {
    Expression::indexed(r(target), r(key))
}

fn prim(kind: PrimitiveKind) -> Expression {
    Expression::primitive(kind)
}

/// `any[]`
fn any_array() -> Expression {
    Expression::lit(TypeValue::Tuple(TupleType::new(vec![], Some(TypeValue::Any))))
}

/// `[head, ...tail]` with `infer` binders.
fn head_tail(head: &str, tail: &str) -> Expression {
    Expression::tuple_with(
        vec![
            TupleElementExpr::required(Expression::infer(head)),
            TupleElementExpr::spread(Expression::infer(tail)),
        ],
        None,
    )
}

fn whitespace() -> Expression {
    Expression::union(vec![
        Expression::lit_str(" "),
        Expression::lit_str("\n"),
        Expression::lit_str("\t"),
    ])
}

/// Install the utility library into `store`.
pub fn register_prelude(store: &DefinitionStore) {
    let before = store.len();

    // ---------------------------------------------------------------------
    // Mapped utilities
    // ---------------------------------------------------------------------

    store.define_type(
        "Pick",
        &["T", "K"],
        Expression::mapped(MappedExpr::new("P", r("K"), index("T", "P"))),
    );
    store.define_type(
        "Omit",
        &["T", "K"],
        apply(
            "Pick",
            vec![r("T"), apply("Exclude", vec![Expression::keyof(r("T")), r("K")])],
        ),
    );
    store.define_type(
        "Readonly",
        &["T"],
        Expression::mapped(
            MappedExpr::new("P", Expression::keyof(r("T")), index("T", "P"))
                .with_readonly(MappedModifier::Add),
        ),
    );
    store.define_type(
        "Mutable",
        &["T"],
        Expression::mapped(
            MappedExpr::new("P", Expression::keyof(r("T")), index("T", "P"))
                .with_readonly(MappedModifier::Remove),
        ),
    );
    store.define_type(
        "Partial",
        &["T"],
        Expression::mapped(
            MappedExpr::new("P", Expression::keyof(r("T")), index("T", "P"))
                .with_optional(MappedModifier::Add),
        ),
    );
    store.define_type(
        "Required",
        &["T"],
        Expression::mapped(
            MappedExpr::new("P", Expression::keyof(r("T")), index("T", "P"))
                .with_optional(MappedModifier::Remove),
        ),
    );
    store.define_type(
        "Record",
        &["K", "T"],
        Expression::mapped(MappedExpr::new("P", r("K"), r("T"))),
    );
    // keyof T[P] is `never` for primitives and functions, which stay as they are.
    store.define_type(
        "DeepReadonly",
        &["T"],
        Expression::mapped(
            MappedExpr::new(
                "P",
                Expression::keyof(r("T")),
                Expression::conditional(
                    Expression::keyof(index("T", "P")),
                    Expression::never(),
                    index("T", "P"),
                    apply("DeepReadonly", vec![index("T", "P")]),
                ),
            )
            .with_readonly(MappedModifier::Add),
        ),
    );
    store.define_type(
        "Getters",
        &["T"],
        Expression::mapped(
            MappedExpr::new(
                "K",
                Expression::keyof(r("T")),
                Expression::function(vec![], index("T", "K")),
            )
            .with_key_remap(Expression::template(vec![
                TemplatePart::text("get"),
                TemplatePart::hole(Expression::string_intrinsic(
                    StringIntrinsicKind::Capitalize,
                    Expression::intersection(vec![r("K"), prim(PrimitiveKind::String)]),
                )),
            ])),
        ),
    );

    // ---------------------------------------------------------------------
    // Conditional utilities
    // ---------------------------------------------------------------------

    store.define_type(
        "Exclude",
        &["T", "U"],
        Expression::conditional(r("T"), r("U"), Expression::never(), r("T")),
    );
    store.define_type(
        "Extract",
        &["T", "U"],
        Expression::conditional(r("T"), r("U"), r("T"), Expression::never()),
    );
    store.define_type(
        "NonNullable",
        &["T"],
        Expression::conditional(
            r("T"),
            Expression::union(vec![prim(PrimitiveKind::Null), prim(PrimitiveKind::Undefined)]),
            Expression::never(),
            r("T"),
        ),
    );
    store.define_type(
        "ReturnType",
        &["T"],
        Expression::conditional(
            r("T"),
            Expression::function_rest(vec![], Expression::lit(TypeValue::Any), Expression::infer("R")),
            r("R"),
            Expression::never(),
        ),
    );
    store.define_type(
        "Parameters",
        &["T"],
        Expression::conditional(
            r("T"),
            Expression::function_rest(vec![], Expression::infer("P"), Expression::lit(TypeValue::Any)),
            r("P"),
            Expression::never(),
        ),
    );
    // [X] extends [Y] keeps both sides from distributing.
    store.define_type(
        "Equal",
        &["X", "Y"],
        Expression::conditional(
            Expression::tuple(vec![r("X")]),
            Expression::tuple(vec![r("Y")]),
            Expression::conditional(
                Expression::tuple(vec![r("Y")]),
                Expression::tuple(vec![r("X")]),
                Expression::lit_bool(true),
                Expression::lit_bool(false),
            ),
            Expression::lit_bool(false),
        ),
    );
    store.define_type(
        "IsNever",
        &["T"],
        Expression::conditional(
            Expression::tuple(vec![r("T")]),
            Expression::tuple(vec![Expression::never()]),
            Expression::lit_bool(true),
            Expression::lit_bool(false),
        ),
    );
    store.define_type(
        "UnionToIntersection",
        &["U"],
        Expression::conditional(
            Expression::conditional(
                r("U"),
                Expression::lit(TypeValue::Any),
                Expression::function(vec![r("U")], prim(PrimitiveKind::Void)),
                Expression::never(),
            ),
            Expression::function(vec![Expression::infer("I")], prim(PrimitiveKind::Void)),
            r("I"),
            Expression::never(),
        ),
    );

    // ---------------------------------------------------------------------
    // Tuple utilities
    // ---------------------------------------------------------------------

    store.define_type(
        "First",
        &["T"],
        Expression::conditional(
            r("T"),
            Expression::tuple_with(
                vec![TupleElementExpr::required(Expression::infer("H"))],
                Some(any_array()),
            ),
            r("H"),
            Expression::never(),
        ),
    );
    store.define_type(
        "Last",
        &["T"],
        Expression::conditional(
            r("T"),
            Expression::tuple_with(
                vec![
                    TupleElementExpr::spread(any_array()),
                    TupleElementExpr::required(Expression::infer("L")),
                ],
                None,
            ),
            r("L"),
            Expression::never(),
        ),
    );
    store.define_type(
        "Reverse",
        &["T"],
        Expression::conditional(
            r("T"),
            head_tail("H", "R"),
            Expression::tuple_with(
                vec![
                    TupleElementExpr::spread(apply("Reverse", vec![r("R")])),
                    TupleElementExpr::required(r("H")),
                ],
                None,
            ),
            Expression::tuple(vec![]),
        ),
    );
    store.define_type(
        "Concat",
        &["T", "U"],
        Expression::tuple_with(
            vec![TupleElementExpr::spread(r("T")), TupleElementExpr::spread(r("U"))],
            None,
        ),
    );
    store.define_type(
        "Push",
        &["T", "U"],
        Expression::tuple_with(
            vec![TupleElementExpr::spread(r("T")), TupleElementExpr::required(r("U"))],
            None,
        ),
    );
    store.define_type(
        "Unshift",
        &["T", "U"],
        Expression::tuple_with(
            vec![TupleElementExpr::required(r("U")), TupleElementExpr::spread(r("T"))],
            None,
        ),
    );
    store.define_type(
        "Length",
        &["T"],
        Expression::indexed(r("T"), Expression::lit_str("length")),
    );
    store.define_type(
        "TupleToUnion",
        &["T"],
        Expression::indexed(r("T"), prim(PrimitiveKind::Number)),
    );
    store.define_type(
        "Includes",
        &["T", "U"],
        Expression::conditional(
            r("T"),
            head_tail("H", "R"),
            Expression::conditional(
                apply("Equal", vec![r("H"), r("U")]),
                Expression::lit_bool(true),
                Expression::lit_bool(true),
                apply("Includes", vec![r("R"), r("U")]),
            ),
            Expression::lit_bool(false),
        ),
    );
    store.define(DefinitionInfo::new(
        "Permutation",
        vec![TypeParamInfo::new("T"), TypeParamInfo::with_default("K", r("T"))],
        Expression::conditional(
            Expression::tuple(vec![r("T")]),
            Expression::tuple(vec![Expression::never()]),
            Expression::tuple(vec![]),
            Expression::conditional(
                r("K"),
                r("K"),
                Expression::tuple_with(
                    vec![
                        TupleElementExpr::required(r("K")),
                        TupleElementExpr::spread(apply(
                            "Permutation",
                            vec![apply("Exclude", vec![r("T"), r("K")])],
                        )),
                    ],
                    None,
                ),
                Expression::never(),
            ),
        ),
    ));

    // ---------------------------------------------------------------------
    // String utilities
    // ---------------------------------------------------------------------

    store.define_type(
        "TrimLeft",
        &["S"],
        Expression::conditional(
            r("S"),
            Expression::template(vec![
                TemplatePart::hole(whitespace()),
                TemplatePart::hole(Expression::infer("R")),
            ]),
            apply("TrimLeft", vec![r("R")]),
            r("S"),
        ),
    );
    store.define_type(
        "TrimRight",
        &["S"],
        Expression::conditional(
            r("S"),
            Expression::template(vec![
                TemplatePart::hole(Expression::infer("L")),
                TemplatePart::hole(whitespace()),
            ]),
            apply("TrimRight", vec![r("L")]),
            r("S"),
        ),
    );
    store.define_type(
        "Trim",
        &["S"],
        apply("TrimLeft", vec![apply("TrimRight", vec![r("S")])]),
    );

    debug!(
        installed = store.len() - before,
        total = store.len(),
        "register_prelude"
    );
}
