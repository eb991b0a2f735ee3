//! Evaluation errors.
//!
//! Every error is terminal for the top-level call that produced it and is
//! returned verbatim: no partial results, no silent `never`/`any` fallback.

use thiserror::Error;

use crate::types::Name;

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum EvaluationError {
    /// A `Ref` or `Apply` target missing from both the scope and the definition table.
    #[error("cannot find name '{name}'")]
    UnboundReference { name: Name },

    /// `Apply` (or a bare `Ref` to a generic definition) with the wrong argument count.
    #[error("type '{target}' requires {expected} type argument(s), found {found}")]
    ArityMismatch {
        target: Name,
        expected: String,
        found: usize,
    },

    /// Indexed access with a key that resolves to no member.
    #[error("property '{key}' does not exist on type '{target}'")]
    NoSuchField { key: String, target: String },

    /// A pattern admits more than one split of the subject.
    #[error("ambiguous match of '{subject}' against pattern {pattern}")]
    MatchAmbiguous { pattern: String, subject: String },

    /// Nested definition applications exceeded the configured depth.
    #[error("type instantiation is excessively deep (depth limit {depth})")]
    RecursionLimit { depth: u32 },

    /// The evaluation step budget was exhausted.
    #[error("evaluation exceeded {limit} steps")]
    IterationLimit { limit: u32 },

    /// `infer` used outside a destructurable pattern position.
    #[error("'infer {name}' is only permitted in a destructurable pattern position")]
    InvalidInferPosition { name: Name },

    /// A mapped type iterated over a key that is not a string or number literal.
    #[error("type '{key}' cannot be used as a mapped type key")]
    InvalidKey { key: String },

    /// A string intrinsic applied to a non-string type.
    #[error("'{intrinsic}' requires a string type argument, found '{found}'")]
    InvalidIntrinsicArgument { intrinsic: &'static str, found: String },
}

pub type EvalResult<T> = Result<T, EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_render_names() {
        let err = EvaluationError::UnboundReference {
            name: Name::from("Foo"),
        };
        assert_eq!(err.to_string(), "cannot find name 'Foo'");

        let err = EvaluationError::ArityMismatch {
            target: Name::from("Pick"),
            expected: "2".to_string(),
            found: 1,
        };
        assert_eq!(
            err.to_string(),
            "type 'Pick' requires 2 type argument(s), found 1"
        );
    }
}
