//! Evaluation rules, one `impl TypeEvaluator` block per concern.

mod application;
mod conditional;
mod index_access;
pub mod infer_pattern;
mod keyof;
mod mapped;
mod string_intrinsic;
mod template_literal;

pub use infer_pattern::MatchOutcome;
