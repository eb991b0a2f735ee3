//! Evaluator configuration.

use serde::{Deserialize, Serialize};

use crate::recursion::RecursionProfile;

/// Cartesian expansions of a template literal larger than this stay symbolic.
pub const DEFAULT_TEMPLATE_EXPANSION_LIMIT: usize = 100_000;

/// Tunable limits for one evaluator.
///
/// Deserializes from partial documents: missing keys take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluatorOptions {
    /// Maximum nesting of definition applications.
    pub max_depth: u32,
    /// Total evaluation steps per top-level call.
    pub max_iterations: u32,
    /// Cache `Apply` results within one top-level call.
    pub memoize: bool,
    pub template_expansion_limit: usize,
}

impl Default for EvaluatorOptions {
    fn default() -> Self {
        let profile = RecursionProfile::TypeEvaluation;
        Self {
            max_depth: profile.max_depth(),
            max_iterations: profile.max_iterations(),
            memoize: true,
            template_expansion_limit: DEFAULT_TEMPLATE_EXPANSION_LIMIT,
        }
    }
}

impl EvaluatorOptions {
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub fn with_memoize(mut self, memoize: bool) -> Self {
        self.memoize = memoize;
        self
    }

    pub fn with_template_expansion_limit(mut self, limit: usize) -> Self {
        self.template_expansion_limit = limit;
        self
    }

    pub fn recursion_profile(&self) -> RecursionProfile {
        RecursionProfile::Custom {
            max_depth: self.max_depth,
            max_iterations: self.max_iterations,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_follow_type_evaluation_profile() {
        let options = EvaluatorOptions::default();
        assert_eq!(options.max_depth, 1000);
        assert_eq!(options.max_iterations, 1_000_000);
        assert!(options.memoize);
    }

    #[test]
    fn partial_document_keeps_defaults() {
        let options: EvaluatorOptions = serde_json::from_str(r#"{"max_depth": 20}"#).unwrap();
        assert_eq!(options.max_depth, 20);
        assert_eq!(options.max_iterations, 1_000_000);
        assert_eq!(
            options.template_expansion_limit,
            DEFAULT_TEMPLATE_EXPANSION_LIMIT
        );
    }
}
