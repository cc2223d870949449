//! stl-cleaner - validate and correct STL files
//!
//! Usage:
//!   stl-cleaner part.stl                   Write part-cleaned.stl
//!   stl-cleaner part.stl -o out.stl        Choose the output file
//!   stl-cleaner part.stl --warnings        Print every correction made

use std::process::ExitCode;

use clap::Parser;
use stlclean_cli::{run, Cli};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(&cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
