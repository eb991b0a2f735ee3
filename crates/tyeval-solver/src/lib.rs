//! Structural Type-Expression Evaluator
//!
//! This crate computes one type from another with a small, closed algebra:
//!
//! - **Conditional types** with distribution over unions for naked parameters
//! - **Structural pattern matching** with `infer` capture over tuples,
//!   objects, functions and template literals
//! - **Mapped types** with key remapping and `readonly`/`?` modifiers
//! - **Recursive definitions** invoked by name, bounded by a recursion guard
//!
//! Values (`TypeValue`) are immutable and always normalized; expressions
//! (`Expression`) are evaluated against an `Environment` layering type
//! parameter bindings over a shared `DefinitionStore`.
//!
//! ```ignore
//! let store = DefinitionStore::new();
//! register_prelude(&store);
//! let env = Environment::new(&store);
//! let value = evaluate(&Expression::apply("Reverse", vec![tuple]), &env)?;
//! ```
pub mod def;
pub mod diagnostics;
pub mod env;
mod evaluate;
pub mod evaluate_rules;
pub mod expr;
mod format;
pub mod normalize;
pub mod options;
pub mod prelude;
pub mod recursion;
pub mod relation;
pub mod types;

pub use def::{DefinitionInfo, DefinitionStore, TypeParamInfo};
pub use diagnostics::{EvalResult, EvaluationError};
pub use env::Environment;
pub use evaluate::{TypeEvaluator, evaluate};
pub use evaluate_rules::MatchOutcome;
pub use expr::{
    ConditionalExpr, Expression, FunctionExpr, InferExpr, MappedExpr, MappedModifier,
    ObjectFieldExpr, StringIntrinsicKind, TemplatePart, TupleElementExpr, TupleExpr,
};
pub use format::{format_js_number, literal_to_string};
pub use normalize::{normalize, structurally_equal};
pub use options::EvaluatorOptions;
pub use prelude::register_prelude;
pub use recursion::{RecursionGuard, RecursionProfile, RecursionResult};
pub use relation::is_assignable;
pub use types::{
    FieldInfo, FunctionType, LiteralValue, Name, OrderedFloat, PrimitiveKind, RecordType,
    TemplateSpan, TupleElement, TupleType, TypeList, TypeValue,
};

// Scenario tests live under tests/ and are compiled into the library test target.
#[cfg(test)]
#[path = "../tests/conditional_comprehensive_tests.rs"]
mod conditional_comprehensive_tests;
#[cfg(test)]
#[path = "../tests/infer_pattern_tests.rs"]
mod infer_pattern_tests;
#[cfg(test)]
#[path = "../tests/mapped_key_remap_tests.rs"]
mod mapped_key_remap_tests;
#[cfg(test)]
#[path = "../tests/template_literal_tests.rs"]
mod template_literal_tests;
#[cfg(test)]
#[path = "../tests/application_tests.rs"]
mod application_tests;
#[cfg(test)]
#[path = "../tests/type_law_tests.rs"]
mod type_law_tests;
#[cfg(test)]
#[path = "../tests/concurrent_tests.rs"]
mod concurrent_tests;
