/// Command-line front end for the STL cleaner
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::tty::IsTty;
use nalgebra::Vector3;
use stlclean_core::geometry::DEFAULT_EPSILON;
use stlclean_core::{clean_file, CleanerConfig, ForceMode, NormalPolicy, OutputEncoding};
use tracing::debug;

pub mod report;

pub use report::Reporter;

/// Validate and correct ASCII and binary STL files.
#[derive(Parser, Debug, Clone)]
#[command(name = "stl-cleaner", version, about)]
pub struct Cli {
    /// STL file to clean
    pub input: PathBuf,

    /// Output file (defaults to <input>-cleaned.stl)
    #[arg(short = 'o', long = "output", alias = "o", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Spaces per nesting level in ASCII output
    #[arg(long, default_value_t = 1)]
    pub indent: usize,

    /// Minimum allowed coordinate per axis
    #[arg(
        long = "min-pos",
        value_name = "X,Y,Z",
        value_parser = parse_min_pos,
        allow_hyphen_values = true,
        default_value = "0.01,0.01,0.01"
    )]
    pub min_pos: Vector3<f64>,

    /// Move the model onto the minimum position even when no axis violates it
    #[arg(long)]
    pub force_repos: bool,

    /// Which axes --force-repos realigns
    #[arg(long, value_enum, default_value_t = ForceModeArg::AllAxes)]
    pub force_mode: ForceModeArg,

    /// Do not read or check endsolid names
    #[arg(long)]
    pub ignore_endsolid_name: bool,

    /// Print every warning and error found
    #[arg(long)]
    pub warnings: bool,

    /// Output encoding
    #[arg(long, value_enum, default_value_t = FormatArg::Preserve)]
    pub format: FormatArg,

    /// How stored normals are checked against the facet geometry
    #[arg(long, value_enum, default_value_t = NormalsArg::ReconcileSign)]
    pub normals: NormalsArg,

    /// Relative tolerance for degenerate facets
    #[arg(long, default_value_t = DEFAULT_EPSILON)]
    pub epsilon: f64,

    /// Exit with a failure status when degenerate facets were found
    #[arg(long)]
    pub strict: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForceModeArg {
    AllAxes,
    WhenAnyViolates,
}

impl From<ForceModeArg> for ForceMode {
    fn from(arg: ForceModeArg) -> Self {
        match arg {
            ForceModeArg::AllAxes => ForceMode::AllAxes,
            ForceModeArg::WhenAnyViolates => ForceMode::WhenAnyViolates,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatArg {
    Preserve,
    Ascii,
    Binary,
}

impl From<FormatArg> for OutputEncoding {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Preserve => OutputEncoding::Preserve,
            FormatArg::Ascii => OutputEncoding::Ascii,
            FormatArg::Binary => OutputEncoding::Binary,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalsArg {
    /// Fix zero and inverted normals only
    ReconcileSign,
    /// Also replace normals that disagree with the facet geometry
    Recompute,
}

impl From<NormalsArg> for NormalPolicy {
    fn from(arg: NormalsArg) -> Self {
        match arg {
            NormalsArg::ReconcileSign => NormalPolicy::ReconcileSign,
            NormalsArg::Recompute => NormalPolicy::Recompute,
        }
    }
}

/// Parse `x,y,z` into a position.
pub fn parse_min_pos(value: &str) -> Result<Vector3<f64>, String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected three comma-separated values, got '{value}'"));
    }

    let mut coords = [0.0f64; 3];
    for (coord, part) in coords.iter_mut().zip(&parts) {
        *coord = part
            .parse()
            .map_err(|_| format!("'{part}' is not a number"))?;
        if !coord.is_finite() {
            return Err(format!("'{part}' is not a finite number"));
        }
    }
    Ok(Vector3::from(coords))
}

impl Cli {
    pub fn config(&self) -> CleanerConfig {
        let mut config = CleanerConfig::default()
            .with_indent(self.indent)
            .with_min_position(self.min_pos)
            .with_ignore_endsolid_name(self.ignore_endsolid_name)
            .with_emit_warnings(self.warnings)
            .with_output_encoding(self.format.into())
            .with_normal_policy(self.normals.into())
            .with_epsilon(self.epsilon);
        if self.force_repos {
            config = config.with_force_repos(self.force_mode.into());
        }
        config
    }
}

/// Clean the input file and report to stdout.
pub fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.config();
    debug!(input = %cli.input.display(), ?config, "cleaning");
    let cleaned = clean_file(&cli.input, cli.output.as_deref(), &config)
        .with_context(|| format!("Failed to clean {}", cli.input.display()))?;

    let mut stdout = io::stdout();
    let reporter = Reporter::new(stdout.is_tty());
    reporter.diagnostics(&mut stdout, &cleaned.outcome.diagnostics)?;
    reporter.summary(&mut stdout, &cleaned)?;
    stdout.flush()?;

    if cli.strict && cleaned.outcome.summary.errors > 0 {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stlclean_core::config::DEFAULT_MIN_POSITION;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("stl-cleaner").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults_match_core_config() {
        let cli = parse(&["part.stl"]);
        assert_eq!(cli.output, None);
        assert_eq!(cli.min_pos, Vector3::from(DEFAULT_MIN_POSITION));
        assert_eq!(cli.config(), CleanerConfig::default());
    }

    #[test]
    fn test_output_aliases() {
        for flag in ["-o", "--output", "--o"] {
            let cli = parse(&["part.stl", flag, "out.stl"]);
            assert_eq!(cli.output, Some(PathBuf::from("out.stl")));
        }
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = parse(&[
            "part.stl",
            "--indent",
            "4",
            "--min-pos",
            "-1,0,2.5",
            "--force-repos",
            "--force-mode",
            "when-any-violates",
            "--ignore-endsolid-name",
            "--warnings",
            "--format",
            "binary",
            "--normals",
            "recompute",
            "--epsilon",
            "1e-9",
        ]);
        let config = cli.config();
        assert_eq!(config.indent, 4);
        assert_eq!(config.min_position, Vector3::new(-1.0, 0.0, 2.5));
        assert!(config.force_repos);
        assert_eq!(config.force_mode, ForceMode::WhenAnyViolates);
        assert!(config.ignore_endsolid_name);
        assert!(config.emit_warnings);
        assert_eq!(config.output_encoding, OutputEncoding::Binary);
        assert_eq!(config.normal_policy, NormalPolicy::Recompute);
        assert_eq!(config.epsilon, 1e-9);
    }

    #[test]
    fn test_force_mode_alone_does_not_force() {
        let cli = parse(&["part.stl", "--force-mode", "when-any-violates"]);
        assert!(!cli.config().force_repos);
    }

    #[test]
    fn test_parse_min_pos() {
        assert_eq!(parse_min_pos("1, 2 ,3").unwrap(), Vector3::new(1.0, 2.0, 3.0));
        assert!(parse_min_pos("1,2").is_err());
        assert!(parse_min_pos("1,2,3,4").is_err());
        assert!(parse_min_pos("1,x,3").is_err());
        assert!(parse_min_pos("1,inf,3").is_err());
    }

    #[test]
    fn test_input_is_required() {
        assert!(Cli::try_parse_from(["stl-cleaner"]).is_err());
    }
}
