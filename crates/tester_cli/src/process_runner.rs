//! Concrete `ScriptRunner`: spawns the script executable as a child
//! process, composing argv per §6 (`key=value` positional arguments plus
//! implicit `te_test_id`/`te_test_name`/`te_rand_seed`), optionally
//! wrapped in `gdb`/`valgrind`, and reduces its exit status.

use std::collections::HashMap;
use std::io::Write as _;
use std::path::PathBuf;
use std::process::Command;

use tester_core::{Flags, ScriptItem, Tin};
use tester_pipeline::{PipelineError, RunOutcome, ScriptRunner};

/// Where gdb-init files and valgrind stderr captures are written.
pub struct ProcessRunner {
    pub scratch_dir: PathBuf,
    pub rand_seed: u64,
}

impl ProcessRunner {
    pub fn new(scratch_dir: impl Into<PathBuf>, rand_seed: u64) -> Self {
        ProcessRunner { scratch_dir: scratch_dir.into(), rand_seed }
    }

    fn compose_argv(&self, item: &ScriptItem, bound_args: &HashMap<String, String>, tin: Tin) -> Vec<String> {
        let mut argv: Vec<String> = bound_args.iter().map(|(k, v)| format!("{k}={v}")).collect();
        argv.sort();
        argv.push(format!("te_test_id={}", tin.0));
        argv.push(format!("te_test_name={}", item.executable));
        argv.push(format!("te_rand_seed={}", self.rand_seed));
        argv
    }

    fn gdb_init_path(&self, tin: Tin) -> PathBuf {
        self.scratch_dir.join(format!("gdbinit.{}", tin.0))
    }

    fn valgrind_log_path(&self, tin: Tin) -> PathBuf {
        self.scratch_dir.join(format!("valgrind.{}.log", tin.0))
    }
}

impl ScriptRunner for ProcessRunner {
    fn run(&mut self, item: &ScriptItem, bound_args: &HashMap<String, String>, tin: Tin, flags: Flags) -> Result<RunOutcome, PipelineError> {
        let argv = self.compose_argv(item, bound_args, tin);

        let mut cmd = if flags.contains(Flags::GDB) {
            let init_path = self.gdb_init_path(tin);
            let mut init = String::new();
            init.push_str("set args");
            for a in &argv {
                init.push(' ');
                init.push_str(a);
            }
            init.push('\n');
            init.push_str("run\n");
            std::fs::write(&init_path, init).map_err(|e| PipelineError::Runner(format!("write gdb init {}: {e}", init_path.display())))?;

            let mut c = Command::new("gdb");
            c.args(["-batch", "-x"]).arg(&init_path).arg(&item.executable);
            c
        } else if flags.contains(Flags::VALGRIND) {
            let log_path = self.valgrind_log_path(tin);
            let mut c = Command::new("valgrind");
            c.arg(format!("--log-file={}", log_path.display()));
            c.arg(&item.executable);
            c.args(&argv);
            c
        } else {
            let mut c = Command::new(&item.executable);
            c.args(&argv);
            c
        };

        let status = cmd.status().map_err(|e| PipelineError::Runner(format!("spawn {}: {e}", item.executable)))?;
        Ok(status_to_outcome(status))
    }
}

#[cfg(unix)]
fn status_to_outcome(status: std::process::ExitStatus) -> RunOutcome {
    use std::os::unix::process::ExitStatusExt;
    match status.code() {
        Some(code) => RunOutcome::Exited(code),
        None => RunOutcome::Signaled {
            signal: status.signal().unwrap_or(0),
            core_dumped: status.core_dumped(),
        },
    }
}

#[cfg(not(unix))]
fn status_to_outcome(status: std::process::ExitStatus) -> RunOutcome {
    match status.code() {
        Some(code) => RunOutcome::Exited(code),
        None => RunOutcome::Signaled { signal: 0, core_dumped: false },
    }
}

/// Flush a single line to `dest`, used by `--interactive` mode to surface
/// progress before the next script starts.
pub fn announce(dest: &mut impl Write, line: &str) {
    let _ = writeln!(dest, "{line}");
    let _ = dest.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composes_kv_args_plus_implicit_ids() {
        let runner = ProcessRunner::new(".", 42);
        let item = ScriptItem { executable: "p".into(), objective: String::new(), reqs: vec![], args: vec![], iterate: 1 };
        let mut bound = HashMap::new();
        bound.insert("y".to_string(), "1".to_string());
        let argv = runner.compose_argv(&item, &bound, Tin(3));
        assert!(argv.contains(&"y=1".to_string()));
        assert!(argv.contains(&"te_test_id=3".to_string()));
        assert!(argv.contains(&"te_test_name=p".to_string()));
        assert!(argv.contains(&"te_rand_seed=42".to_string()));
    }
}
