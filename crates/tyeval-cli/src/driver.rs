//! One CLI run: resolve options, load the program, evaluate, render.

use anyhow::{Context, Result};
use tracing::{debug, info_span};

use crate::args::CliArgs;
use crate::config::resolve_options;
use crate::program::Program;
use tyeval_solver::{
    DefinitionStore, EvalResult, EvaluatorOptions, TypeEvaluator, TypeValue, register_prelude,
};

/// Execute the run described by `args` and return the text to print.
pub fn run(args: &CliArgs) -> Result<String> {
    let options = resolve_options(args)?;
    if args.show_config {
        return serde_json::to_string_pretty(&options).context("failed to serialize options");
    }

    let path = args.program.as_deref().context("no program file given")?;
    let program = Program::load(path)?;
    let _span = info_span!("run", program = %path.display()).entered();

    let value = evaluate_program(&program, args.prelude, options)
        .with_context(|| format!("failed to evaluate {}", path.display()))?;
    render(&value, args.json)
}

/// Evaluate `program` over a fresh definition table.
pub fn evaluate_program(
    program: &Program,
    prelude: bool,
    options: EvaluatorOptions,
) -> EvalResult<TypeValue> {
    let store = DefinitionStore::new();
    if prelude {
        register_prelude(&store);
    }
    program.install(&store);
    let env = program.environment(&store);

    let mut evaluator = TypeEvaluator::with_options(options);
    let result = evaluator.evaluate(&program.expression, &env);
    debug!(ok = result.is_ok(), definitions = store.len(), "evaluate_program");
    result
}

/// TypeScript syntax, or pretty JSON of the value's serde form.
pub fn render(value: &TypeValue, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(value).context("failed to serialize result")
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tyeval_solver::{EvaluationError, Expression, Name};

    fn program(expression: Expression) -> Program {
        Program {
            definitions: Vec::new(),
            bindings: Default::default(),
            expression,
        }
    }

    #[test]
    fn test_prelude_is_opt_in() {
        let reverse = program(Expression::apply(
            "Reverse",
            vec![Expression::tuple(vec![Expression::lit_num(1.0), Expression::lit_num(2.0)])],
        ));
        assert_eq!(
            evaluate_program(&reverse, false, EvaluatorOptions::default()).unwrap_err(),
            EvaluationError::UnboundReference {
                name: Name::from("Reverse")
            }
        );
        let value = evaluate_program(&reverse, true, EvaluatorOptions::default()).unwrap();
        assert_eq!(render(&value, false).unwrap(), "[2, 1]");
    }

    #[test]
    fn test_render_json() {
        let rendered = render(&TypeValue::STRING, true).unwrap();
        assert_eq!(rendered, r#"{
  "Primitive": "string"
}"#);
    }
}
