//! Evaluator option resolution: config file first, then flag overrides.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::args::CliArgs;
use tyeval_solver::EvaluatorOptions;

/// Read evaluator options from a JSON file. Missing keys take their defaults.
pub fn load_options_file(path: &Path) -> Result<EvaluatorOptions> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Resolve the options for one run.
pub fn resolve_options(args: &CliArgs) -> Result<EvaluatorOptions> {
    let mut options = match &args.config {
        Some(path) => load_options_file(path)?,
        None => EvaluatorOptions::default(),
    };

    if let Some(max_depth) = args.max_depth {
        options = options.with_max_depth(max_depth);
    }
    if let Some(max_iterations) = args.max_iterations {
        options = options.with_max_iterations(max_iterations);
    }
    if args.no_memo {
        options = options.with_memoize(false);
    }
    if let Some(limit) = args.template_expansion_limit {
        options = options.with_template_expansion_limit(limit);
    }

    debug!(
        max_depth = options.max_depth,
        max_iterations = options.max_iterations,
        memoize = options.memoize,
        "resolved evaluator options"
    );
    Ok(options)
}
