//! Command-line front end for the `tyeval` type-expression evaluator.
//!
//! Reads a JSON program (definitions, top-level bindings and one expression),
//! evaluates it with `tyeval-solver` and renders the result.

pub mod args;
pub mod config;
pub mod driver;
pub mod program;
pub mod tracing_config;
