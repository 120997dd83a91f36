//! Out-of-band verdict strings reported by a running script, collected
//! by a listener thread and attached to the right iteration by `ExecId`.
//! A single `Mutex` guards the shared map; this is a low-traffic side
//! channel, not a hot path, so a plain mutex is enough.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tester_core::ExecId;

#[derive(Default)]
struct Shared {
    verdicts: HashMap<ExecId, Vec<String>>,
}

/// Owns the shared verdict map; the walker holds this and calls `take`
/// once an iteration finishes.
#[derive(Clone, Default)]
pub struct VerdictsListener {
    shared: Arc<Mutex<Shared>>,
}

impl VerdictsListener {
    pub fn new() -> Self {
        VerdictsListener::default()
    }

    /// A cloneable handle for the side channel that reports verdicts
    /// (e.g. a background thread reading a log stream).
    pub fn handle(&self) -> VerdictsHandle {
        VerdictsHandle { shared: self.shared.clone() }
    }

    /// Remove and return everything recorded for `id` so far.
    pub fn take(&self, id: ExecId) -> Vec<String> {
        self.shared.lock().expect("verdicts mutex poisoned").verdicts.remove(&id).unwrap_or_default()
    }
}

#[derive(Clone)]
pub struct VerdictsHandle {
    shared: Arc<Mutex<Shared>>,
}

impl VerdictsHandle {
    pub fn record(&self, id: ExecId, verdict: impl Into<String>) {
        self.shared
            .lock()
            .expect("verdicts mutex poisoned")
            .verdicts
            .entry(id)
            .or_default()
            .push(verdict.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_verdicts_are_taken_once() {
        let listener = VerdictsListener::new();
        let handle = listener.handle();
        handle.record(ExecId(1), "FAILED: timeout");
        handle.record(ExecId(1), "FAILED: retry exhausted");

        let taken = listener.take(ExecId(1));
        assert_eq!(taken, vec!["FAILED: timeout", "FAILED: retry exhausted"]);
        assert!(listener.take(ExecId(1)).is_empty());
    }

    #[test]
    fn handle_is_shareable_across_threads() {
        let listener = VerdictsListener::new();
        let handle = listener.handle();
        let t = std::thread::spawn(move || {
            handle.record(ExecId(2), "PASSED");
        });
        t.join().unwrap();
        assert_eq!(listener.take(ExecId(2)), vec!["PASSED"]);
    }
}
