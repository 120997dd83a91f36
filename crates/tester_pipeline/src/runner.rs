//! Script execution boundary. Concrete process-spawning lives in
//! `tester_cli`; this crate only depends on the trait so the walker stays
//! testable without a real subprocess.

use std::collections::HashMap;

use tester_core::{Flags, ScriptItem, Tin};

use crate::error::PipelineError;
use crate::reducer::RunOutcome;

/// `run(script, run_name, exec_id, args[], flags) -> TesterStatus` per
/// the runner hook contract: `tin` stands in for `exec_id`, `bound_args`
/// for the ordered name/value argument list, and `flags` carries the
/// diagnostic-mode bits (`Gdb`/`Valgrind`/...) the concrete runner acts
/// on when composing argv.
pub trait ScriptRunner {
    fn run(&mut self, item: &ScriptItem, bound_args: &HashMap<String, String>, tin: Tin, flags: Flags) -> Result<RunOutcome, PipelineError>;
}

/// Always "passes" without doing anything; used for fake-mode runs and
/// in tests that don't care about outcomes.
#[derive(Default)]
pub struct NullRunner;

impl ScriptRunner for NullRunner {
    fn run(&mut self, _item: &ScriptItem, _bound_args: &HashMap<String, String>, _tin: Tin, _flags: Flags) -> Result<RunOutcome, PipelineError> {
        Ok(RunOutcome::Exited(0))
    }
}

/// Replays a fixed sequence of outcomes, one per call, for deterministic
/// tests; panics if called more times than it has outcomes.
pub struct ScriptedRunner {
    outcomes: std::collections::VecDeque<RunOutcome>,
}

impl ScriptedRunner {
    pub fn new(outcomes: impl IntoIterator<Item = RunOutcome>) -> Self {
        ScriptedRunner { outcomes: outcomes.into_iter().collect() }
    }
}

impl ScriptRunner for ScriptedRunner {
    fn run(&mut self, _item: &ScriptItem, _bound_args: &HashMap<String, String>, _tin: Tin, _flags: Flags) -> Result<RunOutcome, PipelineError> {
        Ok(self.outcomes.pop_front().expect("ScriptedRunner exhausted"))
    }
}
