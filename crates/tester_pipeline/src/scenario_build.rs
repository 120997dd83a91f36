//! Merge semantics for combining multiple path matches into one scenario
//! (§4.2 "Merge semantics"). `Run`/`RunFrom`/`RunTo`/`RunForce`/`Exclude`
//! union directly into the main scenario (`RunFrom`/`RunTo` additionally
//! trim the scenario to a single endpoint); `Vg`/`Gdb`/`Fake`/`Mix*`/
//! `NoMix` are flag-carrying overlays applied on top in a second pass, so
//! a diagnostic mode never shrinks what `Run` already selected.

use tester_algo::{resolve_path, AlgoError, PathSegment};
use tester_core::{Config, Flags, Scenario};

use crate::error::PipelineError;

/// One path expression's mode, mirroring the CLI's `--run`/`--vg`/... flags.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PathMode {
    Run,
    RunFrom,
    RunTo,
    RunForce,
    Exclude,
    Vg,
    Gdb,
    Fake,
    MixValues,
    MixArgs,
    MixTests,
    MixIters,
    MixSessions,
    NoMix,
}

impl PathMode {
    fn flags(self) -> Flags {
        match self {
            PathMode::Run | PathMode::RunFrom | PathMode::RunTo => Flags::RUN,
            PathMode::RunForce => Flags::RUN.union(Flags::FORCE),
            PathMode::Exclude => Flags::EXCLUDE,
            PathMode::Vg => Flags::VALGRIND,
            PathMode::Gdb => Flags::GDB,
            PathMode::Fake => Flags::FAKE,
            PathMode::MixValues => Flags::MIX_VALUES,
            PathMode::MixArgs => Flags::MIX_ARGS,
            PathMode::MixTests => Flags::MIX_TESTS,
            PathMode::MixIters => Flags::MIX_ITERS,
            PathMode::MixSessions => Flags::MIX_SESSIONS,
            PathMode::NoMix => Flags::NO_MIX,
        }
    }

    /// `Run`-family modes (plus `Exclude`, itself just a flag bit per
    /// spec.md §4.2) union directly into the main scenario; every other
    /// mode is a flag overlay applied afterward.
    fn is_run_family(self) -> bool {
        matches!(self, PathMode::Run | PathMode::RunFrom | PathMode::RunTo | PathMode::RunForce | PathMode::Exclude)
    }
}

/// One path expression: a mode plus the segments it was parsed into.
pub struct PathExpr<'a> {
    pub mode: PathMode,
    pub segments: &'a [PathSegment],
}

/// Build the main scenario from an ordered list of path expressions: the
/// `Run`-family passes are applied first (in order), then every
/// flag-overlay pass is OR'd in on top, so e.g. `--gdb=/pkg/test` always
/// lands on whatever `--run` already selected regardless of CLI order.
///
/// A path that doesn't resolve to anything (unknown segment) fails
/// silently per spec.md §4.2 ("If no value matches, the whole match
/// fails silently") and §8 ("Path `--run=X` when X not found: empty
/// sub-scenario; merge leaves main scenario unchanged").
///
/// If `exprs` carries no `Run`/`RunFrom`/`RunTo`/`RunForce` expression at
/// all, the main scenario defaults to [`whole_tree_run`] before `Exclude`
/// and the flag overlays are applied, so e.g. a bare `--exclude=/pkg/x`
/// runs everything except what it names rather than nothing.
pub fn build(config: &Config, exprs: &[PathExpr<'_>]) -> Result<Scenario, PipelineError> {
    let narrows = exprs.iter().any(|e| matches!(e.mode, PathMode::Run | PathMode::RunFrom | PathMode::RunTo | PathMode::RunForce));
    let mut main = if narrows { Scenario::new() } else { whole_tree_run(config) };
    let mut overlays: Vec<(Flags, Vec<(u64, u64)>)> = Vec::new();

    for expr in exprs {
        let ranges = match resolve_path(&config.arena, config.root, expr.segments) {
            Ok(r) => r,
            Err(AlgoError::UnknownPathSegment { .. }) => continue,
            Err(e) => return Err(PipelineError::Algo(e)),
        };

        if expr.mode.is_run_family() {
            for &(first, last) in &ranges {
                main.add_flags(first, last, expr.mode.flags())?;
            }
            match expr.mode {
                PathMode::RunFrom => {
                    if let Some(&(first, _)) = ranges.first() {
                        main.truncate_from(first);
                    }
                }
                PathMode::RunTo => {
                    if let Some(&(_, last)) = ranges.last() {
                        main.truncate_to(last);
                    }
                }
                _ => {}
            }
        } else {
            overlays.push((expr.mode.flags(), ranges));
        }
    }

    for (flags, ranges) in overlays {
        for (first, last) in ranges {
            main.add_flags(first, last, flags)?;
        }
    }

    Ok(main)
}

/// A scenario selecting every iteration of `config`, flagged `Run`: the
/// bare root path (`--run=/`) and the baseline used by tests that don't
/// care about path matching.
pub fn whole_tree_run(config: &Config) -> Scenario {
    let mut s = Scenario::new();
    if config.total_iters > 0 {
        s.add_flags(0, config.total_iters - 1, Flags::RUN).expect("whole-tree range is always valid");
    }
    s
}
