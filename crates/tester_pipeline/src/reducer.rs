//! Maps a script's run outcome to a `TesterStatus`, and joins child
//! statuses into their parent's aggregate, monotonically: a group's
//! status is never "better" than its worst child.

/// Outcome of attempting to run one script, independent of how it was
/// run (subprocess, gdb/valgrind wrapper, or skipped).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RunOutcome {
    Exited(i32),
    Signaled { signal: i32, core_dumped: bool },
    TimedOut,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum TesterStatus {
    Incomplete,
    Empty,
    Skipped,
    Faked,
    Passed,
    Search,
    Dirty,
    Prolog,
    Epilog,
    Keepalive,
    Exception,
    Failed,
    Killed,
    Cored,
    Stopped,
    Error,
}

impl TesterStatus {
    /// Total order used to join statuses: higher severity wins.
    fn severity(self) -> u8 {
        use TesterStatus::*;
        match self {
            Passed => 0,
            Skipped => 1,
            Faked => 2,
            Search => 3,
            Incomplete => 4,
            Empty => 5,
            Dirty => 6,
            Prolog => 7,
            Epilog => 8,
            Keepalive => 9,
            Exception => 10,
            Failed => 11,
            Killed => 12,
            Cored => 13,
            Stopped => 14,
            Error => 15,
        }
    }

    pub fn is_exceptional(self) -> bool {
        use TesterStatus::*;
        matches!(self, Failed | Killed | Cored | Stopped | Error)
    }
}

/// Exit-code sentinels a test executable may use instead of a bare
/// nonzero status to report something more specific than "failed".
pub const TE_EXIT_SKIP: i32 = 77;
pub const TE_EXIT_NOT_FOUND: i32 = 78;
pub const TE_EXIT_ERROR: i32 = 79;
pub const TE_EXIT_SIGUSR2: i32 = 80;

const SIGINT: i32 = 2;

/// Exit-status to `TesterStatus` mapping. Core dump wins over everything
/// else; SIGINT (delivered or reported via the `TE_EXIT_SIGUSR2`
/// sentinel) maps to `Stopped` rather than `Killed` so a user-requested
/// interrupt doesn't read as a crash.
pub fn reduce_outcome(outcome: RunOutcome) -> TesterStatus {
    match outcome {
        RunOutcome::Exited(0) => TesterStatus::Passed,
        RunOutcome::Exited(TE_EXIT_SKIP) => TesterStatus::Skipped,
        RunOutcome::Exited(TE_EXIT_NOT_FOUND) => TesterStatus::Search,
        RunOutcome::Exited(TE_EXIT_ERROR) => TesterStatus::Stopped,
        RunOutcome::Exited(TE_EXIT_SIGUSR2) => TesterStatus::Stopped,
        RunOutcome::Exited(_) => TesterStatus::Failed,
        RunOutcome::Signaled { core_dumped: true, .. } => TesterStatus::Cored,
        RunOutcome::Signaled { signal, core_dumped: false } if signal == SIGINT => TesterStatus::Stopped,
        RunOutcome::Signaled { core_dumped: false, .. } => TesterStatus::Killed,
        RunOutcome::TimedOut => TesterStatus::Stopped,
    }
}

/// Fold a child's status into its parent's running aggregate. A `Search`
/// iteration upgrades the group to `Failed` rather than `Search` itself:
/// "not found" is a per-test verdict, but a group containing one is a
/// failed group, not a group in search of something.
pub fn join_status(acc: TesterStatus, child: TesterStatus) -> TesterStatus {
    let effective = if child == TesterStatus::Search { TesterStatus::Failed } else { child };
    if effective.severity() >= acc.severity() {
        effective
    } else {
        acc
    }
}
