//! Offline, deterministic CLI entrypoint.
//!
//! Drives the fixed pipeline end-to-end for every named suite: load its
//! config tree, build a scenario from the path/requirement/dial
//! selectors given, walk it against a real process runner, and render a
//! plain-text report to stdout.

mod args;
mod process_runner;
mod req_expr;

use std::io::{self, Write as _};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tester_algo::{apply_dial_to_scenario, parse_segments};
use tester_core::{DeterministicRng, ExecId, RequirementExpression, Tin};
use tester_io::{ConfigSource, FileResultLog, InMemoryResultLog, JsonConfigSource, ResultLogEntry, ResultLogSource};
use tester_pipeline::{
    build_scenario_from_paths, whole_tree_run, Callbacks, NoopConfigManager, NullRunner, PathExpr, ScriptRunner, TesterStatus,
    VerdictsListener, WalkContext, WalkCtl,
};
use tester_report::{build_model, render_text, TestEntry, Verdict};

use args::{parse_suites, path_exprs, tracing_level, validated_dial, Args, SuiteSpec};
use clap::Parser;
use process_runner::{announce, ProcessRunner};

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(&args);

    match run(&args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("tester: error: {e}");
            ExitCode::from(1)
        }
    }
}

fn init_tracing(args: &Args) {
    let level = tracing_level(args);
    let filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).try_init();
}

fn run(args: &Args) -> Result<ExitCode, String> {
    let suites = parse_suites(args).map_err(|e| e.to_string())?;
    let dial = validated_dial(args).map_err(|e| e.to_string())?;
    let target_req = args.req.as_deref().map(req_expr::parse).transpose().map_err(|e| e.to_string())?;

    let sigint = Arc::new(AtomicBool::new(false));
    install_sigint_handler(&sigint);

    let rand_seed = args.random_seed.unwrap_or(0);
    let mut trc = open_trc(args);

    let mut all_entries = Vec::new();
    let mut worst = TesterStatus::Empty;

    for suite in &suites {
        let (entries, status) = run_suite(args, suite, dial, target_req.as_ref(), rand_seed, &sigint, trc.as_deref_mut())?;
        all_entries.extend(entries);
        worst = tester_pipeline::join_status(worst, status);
        if sigint.load(Ordering::Relaxed) {
            break;
        }
    }

    let model = build_model(suites.iter().map(|s| s.name.as_str()).collect::<Vec<_>>().join(","), all_entries);
    print!("{}", render_text(&model));

    Ok(exit_code_for(worst))
}

fn exit_code_for(status: TesterStatus) -> ExitCode {
    match status {
        TesterStatus::Passed | TesterStatus::Skipped | TesterStatus::Faked | TesterStatus::Empty => ExitCode::from(0),
        _ => ExitCode::from(1),
    }
}

fn open_trc(args: &Args) -> Option<Box<dyn ResultLogSource>> {
    if args.no_trc {
        return None;
    }
    match &args.trc_db {
        Some(path) => Some(Box::new(FileResultLog::new(path.clone()))),
        None => Some(Box::new(InMemoryResultLog::new())),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_suite(
    args: &Args,
    suite: &SuiteSpec,
    dial: Option<u8>,
    target_req: Option<&RequirementExpression>,
    rand_seed: u64,
    sigint: &Arc<AtomicBool>,
    trc: Option<&mut dyn ResultLogSource>,
) -> Result<(Vec<TestEntry>, TesterStatus), String> {
    let source = JsonConfigSource::new(&suite.root);
    let config = source.load(&suite.name).map_err(|e| format!("suite '{}': {e}", suite.name))?;

    let owned_segments: Vec<Vec<_>> = path_exprs(args).iter().map(|raw| parse_segments(&raw.spec)).collect();
    let exprs: Vec<PathExpr<'_>> = path_exprs(args)
        .iter()
        .zip(owned_segments.iter())
        .map(|(raw, segments)| PathExpr { mode: raw.mode, segments })
        .collect();

    let mut scenario = if exprs.is_empty() { whole_tree_run(&config) } else { build_scenario_from_paths(&config, &exprs).map_err(|e| e.to_string())? };

    if let Some(percent) = dial {
        let mut rng = DeterministicRng::from_seed_u64(rand_seed);
        scenario = apply_dial_to_scenario(&scenario, percent, &mut rng);
    }

    let verdicts = VerdictsListener::new();
    let mut callbacks = ReportCallbacks::new(&suite.name, args.quietskip, args.interactive, verdicts.clone(), trc, !args.no_trc);
    let mut cfgmgr = NoopConfigManager::default();

    let mut process_runner;
    let mut null_runner;
    let runner: &mut dyn ScriptRunner = if args.no_run {
        null_runner = NullRunner;
        &mut null_runner
    } else {
        process_runner = ProcessRunner::new(std::env::temp_dir(), rand_seed);
        &mut process_runner
    };

    let mut ctx = WalkContext::new(&mut callbacks, runner, &mut cfgmgr, sigint, false)
        .with_target_req(target_req)
        .with_skip_logues(args.no_logues);

    let mut status = tester_pipeline::walk_config(&config, &scenario, &mut ctx).map_err(|e| e.to_string())?;

    if args.interactive {
        status = tester_pipeline::join_status(status, run_interactive_loop(&config, &mut ctx, dial, rand_seed)?);
    }

    Ok((callbacks.entries, status))
}

/// A minimal REPL: each line is a `--run=`-style path string whose
/// sub-scenario is walked and appended to the running report. Exits on
/// EOF or a bare `quit` line.
fn run_interactive_loop(config: &tester_core::Config, ctx: &mut WalkContext<'_>, dial: Option<u8>, rand_seed: u64) -> Result<TesterStatus, String> {
    use std::io::BufRead;

    let mut worst = TesterStatus::Empty;
    let stdin = io::stdin();
    print!("tester> ");
    io::stdout().flush().map_err(|e| e.to_string())?;

    for line in stdin.lock().lines() {
        let line = line.map_err(|e| e.to_string())?;
        let path = line.trim();
        if path.is_empty() {
            print!("tester> ");
            io::stdout().flush().map_err(|e| e.to_string())?;
            continue;
        }
        if path == "quit" {
            break;
        }

        let segments = parse_segments(path);
        let expr = tester_pipeline::PathExpr { mode: tester_pipeline::PathMode::Run, segments: &segments };
        let built = tester_pipeline::build_scenario_from_paths(config, &[expr]).map_err(|e| e.to_string());
        match built {
            Ok(mut scenario) => {
                if let Some(percent) = dial {
                    let mut rng = DeterministicRng::from_seed_u64(rand_seed);
                    scenario = apply_dial_to_scenario(&scenario, percent, &mut rng);
                }
                match tester_pipeline::walk_config(config, &scenario, ctx) {
                    Ok(sub_status) => {
                        worst = tester_pipeline::join_status(worst, sub_status);
                        println!("-> {sub_status:?}");
                    }
                    Err(e) => eprintln!("tester: error: {e}"),
                }
            }
            Err(e) => eprintln!("tester: error: {e}"),
        }

        print!("tester> ");
        io::stdout().flush().map_err(|e| e.to_string())?;
    }

    Ok(worst)
}

fn install_sigint_handler(flag: &Arc<AtomicBool>) {
    let flag = flag.clone();
    let _ = ctrlc::set_handler(move || {
        flag.store(true, Ordering::Relaxed);
    });
}

/// Walks alongside the scenario walker, turning its session/iteration
/// callbacks into a flat, slash-pathed list of report entries and
/// optionally consulting/recording the historical result log.
struct ReportCallbacks<'a> {
    suite: String,
    stack: Vec<String>,
    entries: Vec<TestEntry>,
    quietskip: bool,
    interactive: bool,
    verdicts: VerdictsListener,
    trc: Option<&'a mut dyn ResultLogSource>,
    trc_enabled: bool,
}

impl<'a> ReportCallbacks<'a> {
    fn new(suite: &str, quietskip: bool, interactive: bool, verdicts: VerdictsListener, trc: Option<&'a mut dyn ResultLogSource>, trc_enabled: bool) -> Self {
        ReportCallbacks { suite: suite.to_string(), stack: Vec::new(), entries: Vec::new(), quietskip, interactive, verdicts, trc, trc_enabled }
    }

    fn current_path(&self, name: &str) -> String {
        let mut parts: Vec<&str> = self.stack.iter().map(String::as_str).collect();
        parts.push(name);
        format!("{}/{}", self.suite, parts.join("/"))
    }
}

impl<'a> Callbacks for ReportCallbacks<'a> {
    fn session_start(&mut self, name: &str) -> WalkCtl {
        self.stack.push(name.to_string());
        WalkCtl::Cont
    }

    fn session_end(&mut self, _name: &str, _status: TesterStatus) -> WalkCtl {
        self.stack.pop();
        WalkCtl::Cont
    }

    fn iter_end(&mut self, tin: Tin, name: &str, status: TesterStatus) -> WalkCtl {
        let verdict = to_verdict(status);
        if self.interactive && !(self.quietskip && verdict == Verdict::Skipped) {
            announce(&mut io::stdout(), &format!("[{}] {} -> {}", tin, self.current_path(name), verdict.as_str()));
        }

        let path = self.current_path(name);
        let key = format!("{path}#{tin}");
        let (expected, matched_expected) = match self.trc.as_deref() {
            Some(log) => {
                let prior = log.find(&key).map(|e| e.status);
                let matched = prior.as_deref().map(|p| p == verdict.as_str());
                (prior, matched)
            }
            None => (None, None),
        };
        if self.trc_enabled {
            if let Some(log) = self.trc.as_deref_mut() {
                let _ = log.append(ResultLogEntry { key, status: verdict.as_str().to_string() });
            }
        }

        let verdict_strings = self.verdicts.take(ExecId(tin.0));
        self.entries.push(TestEntry { tin, path, verdict, expected, matched_expected, verdicts: verdict_strings });
        WalkCtl::Cont
    }
}

fn to_verdict(status: TesterStatus) -> Verdict {
    match status {
        TesterStatus::Incomplete => Verdict::Incomplete,
        TesterStatus::Empty => Verdict::Empty,
        TesterStatus::Skipped => Verdict::Skipped,
        TesterStatus::Faked => Verdict::Faked,
        TesterStatus::Passed => Verdict::Passed,
        TesterStatus::Search => Verdict::Search,
        TesterStatus::Dirty => Verdict::Dirty,
        TesterStatus::Prolog => Verdict::Prolog,
        TesterStatus::Epilog => Verdict::Epilog,
        TesterStatus::Keepalive => Verdict::Keepalive,
        TesterStatus::Exception => Verdict::Exception,
        TesterStatus::Failed => Verdict::Failed,
        TesterStatus::Killed => Verdict::Killed,
        TesterStatus::Cored => Verdict::Cored,
        TesterStatus::Stopped => Verdict::Stopped,
        TesterStatus::Error => Verdict::Error,
    }
}
