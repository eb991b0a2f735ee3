//! Tests for argument parsing, option resolution and end-to-end runs.

use clap::Parser;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use tyeval_cli::args::CliArgs;
use tyeval_cli::config::resolve_options;
use tyeval_cli::driver;
use tyeval_cli::program::Program;
use tyeval_solver::{Expression, TypeValue};

const PICK_PROGRAM: &str = r#"
{
  "bindings": {
    "Todo": {
      "Record": {
        "title": { "type_value": { "Primitive": "string" } },
        "description": { "type_value": { "Primitive": "string" } },
        "completed": { "type_value": { "Primitive": "boolean" } }
      }
    }
  },
  "expression": {
    "Apply": ["Pick", [
      { "Ref": "Todo" },
      { "Union": [
        { "Lit": { "Literal": { "String": "title" } } },
        { "Lit": { "Literal": { "String": "completed" } } }
      ] }
    ]]
  }
}
"#;

const LOOP_PROGRAM: &str = r#"
{
  "definitions": [
    { "name": "Loop", "params": [{ "name": "T" }], "body": { "Apply": ["Loop", [{ "Ref": "T" }]] } }
  ],
  "expression": { "Apply": ["Loop", [{ "Lit": { "Primitive": "string" } }]] }
}
"#;

/// Write `content` to `name` inside `dir`.
fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn parse(args: &[&str]) -> CliArgs {
    CliArgs::try_parse_from(std::iter::once("tyeval").chain(args.iter().copied())).unwrap()
}

fn run(args: &[&str]) -> anyhow::Result<String> {
    driver::run(&parse(args))
}

// =============================================================================
// Arguments and options
// =============================================================================

#[test]
fn test_parse_flags() {
    let args = parse(&["program.json", "--prelude", "--json", "--max-depth", "5", "--no-memo"]);
    assert_eq!(args.program, Some(PathBuf::from("program.json")));
    assert!(args.prelude);
    assert!(args.json);
    assert_eq!(args.max_depth, Some(5));
    assert!(args.no_memo);
    assert_eq!(args.max_iterations, None);
}

#[test]
fn test_program_is_required_unless_showing_config() {
    assert!(CliArgs::try_parse_from(["tyeval"]).is_err());
    assert!(CliArgs::try_parse_from(["tyeval", "--show-config"]).is_ok());
}

#[test]
fn test_flags_override_config_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_file(
        temp_dir.path(),
        "tyeval.json",
        r#"{ "max_depth": 20, "max_iterations": 500 }"#,
    );
    let config = config.to_str().unwrap();

    let options = resolve_options(&parse(&["p.json", "--config", config])).unwrap();
    assert_eq!(options.max_depth, 20);
    assert_eq!(options.max_iterations, 500);
    assert!(options.memoize);

    let options =
        resolve_options(&parse(&["p.json", "--config", config, "--max-depth", "7", "--no-memo"]))
            .unwrap();
    assert_eq!(options.max_depth, 7);
    assert_eq!(options.max_iterations, 500);
    assert!(!options.memoize);
}

#[test]
fn test_bad_config_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let config = write_file(temp_dir.path(), "tyeval.json", "{ not json");
    let err = resolve_options(&parse(&["p.json", "--config", config.to_str().unwrap()]))
        .unwrap_err();
    assert!(format!("{err:#}").contains("failed to parse config file"));
}

#[test]
fn test_show_config_prints_resolved_options() {
    let output = run(&["--show-config", "--max-depth", "12"]).unwrap();
    let shown: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(shown["max_depth"], 12);
    assert_eq!(shown["memoize"], true);
}

// =============================================================================
// Programs
// =============================================================================

#[test]
fn test_program_round_trips_through_json() {
    let program = Program::from_json(PICK_PROGRAM).unwrap();
    assert!(program.definitions.is_empty());
    assert!(matches!(program.expression, Expression::Apply(..)));
    let text = serde_json::to_string(&program).unwrap();
    assert_eq!(Program::from_json(&text).unwrap(), program);
}

#[test]
fn test_unknown_program_key_is_rejected() {
    let err = Program::from_json(r#"{ "expresion": { "Ref": "T" } }"#).unwrap_err();
    assert!(format!("{err:#}").contains("invalid program document"));
}

#[test]
fn test_run_pick_with_prelude() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "pick.json", PICK_PROGRAM);
    let output = run(&[path.to_str().unwrap(), "--prelude"]).unwrap();
    assert_eq!(output, "{ title: string; completed: boolean }");
}

#[test]
fn test_run_without_prelude_reports_unbound_name() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "pick.json", PICK_PROGRAM);
    let err = run(&[path.to_str().unwrap()]).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("failed to evaluate"));
    assert!(message.contains("cannot find name 'Pick'"));
}

#[test]
fn test_run_json_output() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(
        temp_dir.path(),
        "upper.json",
        r#"{ "expression": { "StringIntrinsic": ["Uppercase", { "Lit": { "Literal": { "String": "abc" } } }] } }"#,
    );
    let output = run(&[path.to_str().unwrap(), "--json"]).unwrap();
    let value: TypeValue = serde_json::from_str(&output).unwrap();
    assert_eq!(value, TypeValue::literal_string("ABC"));
}

#[test]
fn test_recursion_limit_follows_options() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_file(temp_dir.path(), "loop.json", LOOP_PROGRAM);
    let path = path.to_str().unwrap();

    let err = run(&[path]).unwrap_err();
    assert!(format!("{err:#}").contains("depth limit 1000"));

    let err = run(&[path, "--max-depth", "10"]).unwrap_err();
    assert!(format!("{err:#}").contains("depth limit 10)"));
}

#[test]
fn test_missing_program_file() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("missing.json");
    let err = run(&[missing.to_str().unwrap()]).unwrap_err();
    assert!(format!("{err:#}").contains("failed to read program"));
}
