//! The report model: one entry per executed iteration plus a rolled-up
//! summary. Deliberately decoupled from `tester_pipeline::TesterStatus`
//! (this crate depends only on `tester_core`) — the CLI maps each
//! iteration's `TesterStatus` into a `Verdict` when it builds the model.

use std::collections::BTreeMap;

use tester_core::Tin;

/// A reportable outcome for one iteration. Mirrors §4.7's `TesterStatus`
/// set; kept as this crate's own enum so `tester_report` never has to
/// depend on `tester_pipeline`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Verdict {
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

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Incomplete => "incomplete",
            Verdict::Empty => "empty",
            Verdict::Skipped => "skipped",
            Verdict::Faked => "faked",
            Verdict::Passed => "passed",
            Verdict::Search => "search",
            Verdict::Dirty => "dirty",
            Verdict::Prolog => "prolog",
            Verdict::Epilog => "epilog",
            Verdict::Keepalive => "keepalive",
            Verdict::Exception => "exception",
            Verdict::Failed => "failed",
            Verdict::Killed => "killed",
            Verdict::Cored => "cored",
            Verdict::Stopped => "stopped",
            Verdict::Error => "error",
        }
    }

    /// Whether this verdict counts toward a "clean" run for the plain
    /// one-line summary (`Passed`/`Skipped`/`Faked` are all non-failures).
    pub fn is_pass(self) -> bool {
        matches!(self, Verdict::Passed | Verdict::Skipped | Verdict::Faked)
    }
}

/// One reported iteration: which test, what happened, and how it
/// compared against the expected-results database, if one was consulted.
#[derive(Clone, Debug)]
pub struct TestEntry {
    pub tin: Tin,
    /// Slash-separated path to the script, e.g. `suite/session/script`.
    pub path: String,
    pub verdict: Verdict,
    /// Expected status string from the TRC database, if cross-checked.
    pub expected: Option<String>,
    /// `Some(true)` when `verdict` matched `expected`; `None` when no
    /// expected-results database was consulted for this iteration.
    pub matched_expected: Option<bool>,
    /// Out-of-band verdict strings attached by the verdicts listener.
    pub verdicts: Vec<String>,
}

/// Roll-up counts over a `ReportModel`'s entries.
#[derive(Clone, Debug, Default)]
pub struct Summary {
    pub total: u64,
    pub by_verdict: BTreeMap<&'static str, u64>,
    /// Iterations whose observed verdict disagreed with their expected
    /// status (only meaningful where `matched_expected` is `Some(false)`).
    pub mismatches: u64,
}

impl Summary {
    pub fn passed(&self) -> u64 {
        [Verdict::Passed, Verdict::Skipped, Verdict::Faked]
            .iter()
            .map(|v| self.by_verdict.get(v.as_str()).copied().unwrap_or(0))
            .sum()
    }

    pub fn pass_rate(&self) -> Option<f64> {
        if self.total == 0 {
            None
        } else {
            Some(self.passed() as f64 / self.total as f64)
        }
    }
}

/// A complete, renderer-agnostic report for one campaign run.
#[derive(Clone, Debug)]
pub struct ReportModel {
    pub suite: String,
    pub entries: Vec<TestEntry>,
    pub summary: Summary,
}

/// Build the report model from a flat, TIN-ordered list of entries.
pub fn build_model(suite: impl Into<String>, entries: Vec<TestEntry>) -> ReportModel {
    let mut summary = Summary::default();
    for entry in &entries {
        summary.total += 1;
        *summary.by_verdict.entry(entry.verdict.as_str()).or_insert(0) += 1;
        if entry.matched_expected == Some(false) {
            summary.mismatches += 1;
        }
    }
    ReportModel { suite: suite.into(), entries, summary }
}

/// Format a fraction `x` (0.0..=1.0) as a percentage with one decimal
/// place, round-half-up, ASCII-only. Returns `"—"` if `x` is out of range
/// or non-finite.
pub fn percent_1dp(x: f64) -> String {
    if !x.is_finite() || !(0.0..=1.0).contains(&x) {
        return "—".to_string();
    }
    let scaled = ((x * 1000.0) + 0.5).floor() / 10.0;
    format!("{scaled:.1}%")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(tin: u64, path: &str, verdict: Verdict) -> TestEntry {
        TestEntry { tin: Tin(tin), path: path.into(), verdict, expected: None, matched_expected: None, verdicts: Vec::new() }
    }

    #[test]
    fn summary_counts_by_verdict_and_mismatches() {
        let entries = vec![
            entry(0, "suite/p", Verdict::Passed),
            entry(1, "suite/q", Verdict::Failed),
            TestEntry {
                expected: Some("passed".into()),
                matched_expected: Some(false),
                ..entry(2, "suite/r", Verdict::Failed)
            },
        ];
        let model = build_model("suite", entries);
        assert_eq!(model.summary.total, 3);
        assert_eq!(model.summary.by_verdict.get("passed"), Some(&1));
        assert_eq!(model.summary.by_verdict.get("failed"), Some(&2));
        assert_eq!(model.summary.mismatches, 1);
    }

    #[test]
    fn pass_rate_counts_skipped_and_faked_as_passing() {
        let entries = vec![entry(0, "suite/p", Verdict::Passed), entry(1, "suite/q", Verdict::Skipped), entry(2, "suite/r", Verdict::Failed)];
        let model = build_model("suite", entries);
        assert_eq!(model.summary.passed(), 2);
        assert_eq!(percent_1dp(model.summary.pass_rate().unwrap()), "66.7%");
    }

    #[test]
    fn percent_rounds_half_up_and_rejects_out_of_range() {
        assert_eq!(percent_1dp(0.0), "0.0%");
        assert_eq!(percent_1dp(1.0), "100.0%");
        assert_eq!(percent_1dp(0.1235), "12.4%");
        assert_eq!(percent_1dp(f64::NAN), "—");
        assert_eq!(percent_1dp(1.5), "—");
    }

    #[test]
    fn empty_model_has_no_pass_rate() {
        let model = build_model("suite", Vec::new());
        assert_eq!(model.summary.pass_rate(), None);
    }
}
