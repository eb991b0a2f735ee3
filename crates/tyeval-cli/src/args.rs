use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for the tyeval binary.
#[derive(Parser, Debug)]
#[command(
    name = "tyeval",
    version,
    about = "Evaluate structural type expressions: conditional, mapped and template literal types"
)]
pub struct CliArgs {
    /// JSON program to evaluate.
    #[arg(required_unless_present = "show_config")]
    pub program: Option<PathBuf>,

    // ==================== Definitions ====================
    /// Install the utility library (Pick, Omit, Reverse, ...) before the program's definitions.
    #[arg(long)]
    pub prelude: bool,

    // ==================== Output ====================
    /// Print the result as JSON instead of TypeScript syntax.
    #[arg(long)]
    pub json: bool,

    /// Print the resolved evaluator options and exit.
    #[arg(long = "show-config", alias = "showConfig")]
    pub show_config: bool,

    // ==================== Limits ====================
    /// JSON file with evaluator options; flags override its values.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Maximum nesting of definition applications.
    #[arg(long = "max-depth")]
    pub max_depth: Option<u32>,

    /// Total evaluation steps allowed for the expression.
    #[arg(long = "max-iterations")]
    pub max_iterations: Option<u32>,

    /// Disable caching of definition applications.
    #[arg(long = "no-memo")]
    pub no_memo: bool,

    /// Largest template literal expansion kept as a union of literals.
    #[arg(long = "template-expansion-limit")]
    pub template_expansion_limit: Option<usize>,
}
