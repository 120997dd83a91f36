//! JSON report renderer. Builds with `serde_json`'s `preserve_order`
//! feature so the emitted object keys follow insertion order (suite,
//! summary, entries) rather than sorting alphabetically.

use serde_json::{Map as JsonMap, Value};

use crate::model::{percent_1dp, ReportModel, TestEntry};

fn obj() -> JsonMap<String, Value> {
    JsonMap::new()
}

/// Render `model` as a `serde_json::Value`; callers that want bytes call
/// `serde_json::to_string`/`to_string_pretty` on the result themselves.
pub fn render_json(model: &ReportModel) -> Value {
    let mut root = obj();
    root.insert("suite".into(), Value::String(model.suite.clone()));
    root.insert("summary".into(), summary_json(model));
    root.insert("entries".into(), Value::Array(model.entries.iter().map(entry_json).collect()));
    Value::Object(root)
}

fn summary_json(model: &ReportModel) -> Value {
    let mut s = obj();
    s.insert("total".into(), Value::from(model.summary.total));
    let mut by_verdict = obj();
    for (verdict, count) in &model.summary.by_verdict {
        by_verdict.insert((*verdict).to_string(), Value::from(*count));
    }
    s.insert("by_verdict".into(), Value::Object(by_verdict));
    s.insert("mismatches".into(), Value::from(model.summary.mismatches));
    match model.summary.pass_rate() {
        Some(rate) => {
            s.insert("pass_rate".into(), Value::from(rate));
            s.insert("pass_rate_display".into(), Value::String(percent_1dp(rate)));
        }
        None => {
            s.insert("pass_rate".into(), Value::Null);
        }
    }
    Value::Object(s)
}

fn entry_json(entry: &TestEntry) -> Value {
    let mut e = obj();
    e.insert("tin".into(), Value::from(entry.tin.0));
    e.insert("path".into(), Value::String(entry.path.clone()));
    e.insert("verdict".into(), Value::String(entry.verdict.as_str().to_string()));
    if let Some(expected) = &entry.expected {
        e.insert("expected".into(), Value::String(expected.clone()));
    }
    if let Some(matched) = entry.matched_expected {
        e.insert("matched_expected".into(), Value::Bool(matched));
    }
    if !entry.verdicts.is_empty() {
        e.insert("verdicts".into(), Value::Array(entry.verdicts.iter().cloned().map(Value::String).collect()));
    }
    Value::Object(e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{build_model, Verdict};
    use tester_core::Tin;

    #[test]
    fn renders_entries_and_summary() {
        let entries = vec![TestEntry {
            tin: Tin(0),
            path: "suite/p".into(),
            verdict: Verdict::Passed,
            expected: Some("passed".into()),
            matched_expected: Some(true),
            verdicts: Vec::new(),
        }];
        let model = build_model("suite", entries);
        let json = render_json(&model);
        assert_eq!(json["suite"], "suite");
        assert_eq!(json["summary"]["total"], 1);
        assert_eq!(json["entries"][0]["path"], "suite/p");
        assert_eq!(json["entries"][0]["matched_expected"], true);
    }

    #[test]
    fn omits_pass_rate_display_when_no_entries() {
        let model = build_model("suite", Vec::new());
        let json = render_json(&model);
        assert!(json["summary"]["pass_rate"].is_null());
        assert!(json["summary"].get("pass_rate_display").is_none());
    }
}
