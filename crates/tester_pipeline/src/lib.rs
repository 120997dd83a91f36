//! Deterministic orchestration of the test-orchestrator pipeline:
//! prepare the tree, build and dial the scenario, walk it, and reduce
//! each script's exit into a reportable status. Depends on `tester_core`
//! (tree, scenario algebra, RNG) and `tester_algo` (path matcher, dial
//! sampler); the CLI crate supplies the concrete `ScriptRunner` and
//! `ConfigManager` implementations this crate only defines traits for.

pub mod cfgmgr;
pub mod error;
pub mod prepare;
pub mod reducer;
pub mod runner;
pub mod scenario_build;
pub mod verdicts;
pub mod walker;

pub use cfgmgr::{BackupHandle, ConfigManager, DriftingConfigManager, NoopConfigManager};
pub use error::PipelineError;
pub use prepare::{enter_session, prepare_config, EffectiveHooks, InheritedHooks};
pub use reducer::{join_status, reduce_outcome, RunOutcome, TesterStatus, TE_EXIT_ERROR, TE_EXIT_NOT_FOUND, TE_EXIT_SIGUSR2, TE_EXIT_SKIP};
pub use runner::{NullRunner, ScriptRunner, ScriptedRunner};
pub use scenario_build::{build as build_scenario_from_paths, whole_tree_run, PathExpr, PathMode};
pub use verdicts::{VerdictsHandle, VerdictsListener};
pub use walker::{walk_config, Callbacks, NullCallbacks, WalkCtl, WalkContext};
