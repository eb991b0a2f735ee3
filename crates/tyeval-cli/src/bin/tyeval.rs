#![allow(clippy::print_stderr)]

use clap::Parser;
use std::process::ExitCode;

use tyeval_cli::args::CliArgs;
use tyeval_cli::{driver, tracing_config};

fn main() -> ExitCode {
    // Initialize tracing if TYEVAL_LOG or RUST_LOG is set (zero cost otherwise).
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    match driver::run(&args) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
