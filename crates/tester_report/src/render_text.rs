//! Plain-text report renderer: one line per iteration, then a summary
//! footer. Intended for a terminal or a log file, not machine parsing.

use crate::model::ReportModel;

/// Render `model` as a human-readable multi-line report.
pub fn render_text(model: &ReportModel) -> String {
    let mut out = String::new();
    out.push_str(&format!("suite: {}\n", model.suite));
    out.push_str(&"-".repeat(40));
    out.push('\n');

    for entry in &model.entries {
        let verdict = entry.verdict.as_str().to_ascii_uppercase();
        match entry.matched_expected {
            Some(false) => {
                out.push_str(&format!(
                    "{tin:>6}  {verdict:<10} {path}  (expected {expected})\n",
                    tin = entry.tin,
                    path = entry.path,
                    expected = entry.expected.as_deref().unwrap_or("?"),
                ));
            }
            _ => {
                out.push_str(&format!("{tin:>6}  {verdict:<10} {path}\n", tin = entry.tin, path = entry.path));
            }
        }
        for v in &entry.verdicts {
            out.push_str(&format!("        verdict: {v}\n"));
        }
    }

    out.push_str(&"-".repeat(40));
    out.push('\n');
    out.push_str(&format!("total: {}\n", model.summary.total));
    for (verdict, count) in &model.summary.by_verdict {
        out.push_str(&format!("  {verdict}: {count}\n"));
    }
    if let Some(rate) = model.summary.pass_rate() {
        out.push_str(&format!("pass rate: {}\n", crate::model::percent_1dp(rate)));
    }
    if model.summary.mismatches > 0 {
        out.push_str(&format!("mismatches vs expected: {}\n", model.summary.mismatches));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_model, TestEntry, Verdict};
    use tester_core::Tin;

    #[test]
    fn renders_one_line_per_entry_and_a_footer() {
        let entries = vec![
            TestEntry { tin: Tin(0), path: "suite/p".into(), verdict: Verdict::Passed, expected: None, matched_expected: None, verdicts: Vec::new() },
            TestEntry {
                tin: Tin(1),
                path: "suite/q".into(),
                verdict: Verdict::Failed,
                expected: Some("passed".into()),
                matched_expected: Some(false),
                verdicts: vec!["FAILED: timeout".into()],
            },
        ];
        let model = build_model("suite", entries);
        let text = render_text(&model);
        assert!(text.contains("suite/p"));
        assert!(text.contains("(expected passed)"));
        assert!(text.contains("verdict: FAILED: timeout"));
        assert!(text.contains("total: 2"));
        assert!(text.contains("mismatches vs expected: 1"));
    }
}
