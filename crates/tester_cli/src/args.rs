//! Deterministic, offline CLI argument parsing & validation.

use std::path::PathBuf;

use clap::Parser;

/// Orchestrator binary: loads a named suite, builds a scenario from the
/// path/dial/requirement selectors given, walks it, and renders a report.
#[derive(Debug, Parser)]
#[command(name = "tester", version)]
pub struct Args {
    /// `name:path` — a named suite and the directory its JSON config
    /// tree lives under. Repeatable; every named suite is walked, each
    /// under the same path/requirement/dial selectors.
    #[arg(long = "suite", required = true)]
    pub suites: Vec<String>,

    #[arg(long = "no-run")]
    pub no_run: bool,
    /// Accepted for CLI-surface parity; this orchestrator has no build
    /// step of its own (config trees are loaded, not compiled), so it is
    /// parsed and otherwise ignored.
    #[arg(long = "no-build")]
    pub no_build: bool,
    #[arg(long = "no-trc")]
    pub no_trc: bool,
    /// Accepted for CLI-surface parity; the shipped `ConfigManager` is
    /// already the in-memory no-op backend (no real backup/restore
    /// device is wired up in this slice), so disabling it changes nothing.
    #[arg(long = "no-cs")]
    pub no_cs: bool,
    #[arg(long = "no-cfg-track")]
    pub no_cfg_track: bool,
    #[arg(long = "no-logues")]
    pub no_logues: bool,

    /// Target-requirement expression, e.g. `smoke&!slow`.
    #[arg(long = "req")]
    pub req: Option<String>,

    #[arg(long = "quietskip")]
    pub quietskip: bool,

    #[arg(long = "fake")]
    pub fake: Vec<String>,
    #[arg(long = "run")]
    pub run: Vec<String>,
    #[arg(long = "run-from")]
    pub run_from: Vec<String>,
    #[arg(long = "run-to")]
    pub run_to: Vec<String>,
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
    #[arg(long = "vg")]
    pub vg: Vec<String>,
    #[arg(long = "gdb")]
    pub gdb: Vec<String>,

    #[arg(long = "random-seed")]
    pub random_seed: Option<u64>,

    /// Reduce the built scenario to a random `dial`% subset before
    /// walking, order-preserving; `0..=100`.
    #[arg(long = "dial")]
    pub dial: Option<u8>,

    #[arg(long = "trc-db")]
    pub trc_db: Option<PathBuf>,
    #[arg(long = "trc-tag")]
    pub trc_tag: Option<String>,

    /// Stackable `-v`/`--verbose`, up to 4 levels.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
    /// Stackable `-q`/`--quiet`, up to 4 levels.
    #[arg(short = 'q', long = "quiet", action = clap::ArgAction::Count)]
    pub quiet: u8,

    #[arg(long = "interactive")]
    pub interactive: bool,
}

#[derive(Debug)]
pub enum CliError {
    BadPathSpec(String),
    BadSuiteSpec(String),
    BadRequirement(String),
    SuiteNotFound(String),
    BadDial(u8),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::BadPathSpec(s) => write!(f, "malformed path selector: {s}"),
            CliError::BadSuiteSpec(s) => write!(f, "malformed --suite (expected name:path): {s}"),
            CliError::BadRequirement(s) => write!(f, "malformed --req expression: {s}"),
            CliError::SuiteNotFound(s) => write!(f, "no --suite named {s}"),
            CliError::BadDial(d) => write!(f, "--dial={d} out of range (expected 0..=100)"),
        }
    }
}

impl std::error::Error for CliError {}

/// One `--suite name:path` entry.
#[derive(Debug, Clone)]
pub struct SuiteSpec {
    pub name: String,
    pub root: PathBuf,
}

/// A path-mode flag value paired with the raw selector string that
/// followed it (`--run=/pkg/test:arg=v`), in the order given on the
/// command line across every path-carrying flag.
#[derive(Debug, Clone)]
pub struct RawPathExpr {
    pub mode: tester_pipeline::PathMode,
    pub spec: String,
}

/// Verbosity level, `0..=4`; `--quiet` counts down from whatever
/// `--verbose` set, floored at 0 (quiet always wins ties).
pub fn verbosity_level(args: &Args) -> i8 {
    (args.verbose as i8 - args.quiet as i8).clamp(-4, 4)
}

pub fn tracing_level(args: &Args) -> tracing::Level {
    match verbosity_level(args) {
        i8::MIN..=-2 => tracing::Level::ERROR,
        -1 => tracing::Level::WARN,
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }
}

pub fn parse_suites(args: &Args) -> Result<Vec<SuiteSpec>, CliError> {
    args.suites
        .iter()
        .map(|s| {
            s.split_once(':')
                .map(|(name, path)| SuiteSpec { name: name.to_string(), root: PathBuf::from(path) })
                .ok_or_else(|| CliError::BadSuiteSpec(s.clone()))
        })
        .collect()
}

/// Validate `--dial`, if given, is in `0..=100`.
pub fn validated_dial(args: &Args) -> Result<Option<u8>, CliError> {
    match args.dial {
        Some(d) if d > 100 => Err(CliError::BadDial(d)),
        other => Ok(other),
    }
}

/// Flatten every path-carrying flag into its `(mode, spec)` pairs, in
/// command-line declaration order within each flag group (clap does not
/// preserve cross-flag interleaving order, matching §4.2's "in order
/// given" guarantee only within a single flag).
pub fn path_exprs(args: &Args) -> Vec<RawPathExpr> {
    use tester_pipeline::PathMode;

    let mut out = Vec::new();
    let mut push = |mode: PathMode, specs: &[String]| {
        out.extend(specs.iter().map(|spec| RawPathExpr { mode, spec: spec.clone() }));
    };
    push(PathMode::Run, &args.run);
    push(PathMode::RunFrom, &args.run_from);
    push(PathMode::RunTo, &args.run_to);
    push(PathMode::Exclude, &args.exclude);
    push(PathMode::Vg, &args.vg);
    push(PathMode::Gdb, &args.gdb);
    push(PathMode::Fake, &args.fake);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_nets_verbose_against_quiet() {
        let mut args = Args::parse_from(["tester", "--suite", "s:."]);
        args.verbose = 2;
        args.quiet = 1;
        assert_eq!(verbosity_level(&args), 1);
    }

    #[test]
    fn parses_suite_name_and_path() {
        let args = Args::parse_from(["tester", "--suite", "smoke:configs/smoke"]);
        let suites = parse_suites(&args).unwrap();
        assert_eq!(suites.len(), 1);
        assert_eq!(suites[0].name, "smoke");
        assert_eq!(suites[0].root, PathBuf::from("configs/smoke"));
    }

    #[test]
    fn rejects_suite_without_colon() {
        let args = Args::parse_from(["tester", "--suite", "nocolon"]);
        assert!(matches!(parse_suites(&args), Err(CliError::BadSuiteSpec(_))));
    }

    #[test]
    fn dial_over_100_is_rejected() {
        let mut args = Args::parse_from(["tester", "--suite", "s:."]);
        args.dial = Some(101);
        assert!(matches!(validated_dial(&args), Err(CliError::BadDial(101))));
    }

    #[test]
    fn path_exprs_preserves_per_flag_order() {
        let mut args = Args::parse_from(["tester", "--suite", "s:."]);
        args.run = vec!["/a".into(), "/b".into()];
        args.gdb = vec!["/c".into()];
        let exprs = path_exprs(&args);
        assert_eq!(exprs.len(), 3);
        assert!(matches!(exprs[0].mode, tester_pipeline::PathMode::Run));
        assert!(matches!(exprs[2].mode, tester_pipeline::PathMode::Gdb));
    }
}
