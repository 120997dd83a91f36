//! Collaborator boundary for the historical result log, consulted by the
//! `Search` reducer outcome and appended to as iterations complete.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::IoError;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultLogEntry {
    pub key: String,
    pub status: String,
}

pub trait ResultLogSource {
    fn find(&self, key: &str) -> Option<ResultLogEntry>;
    fn append(&mut self, entry: ResultLogEntry) -> Result<(), IoError>;
}

#[derive(Default)]
pub struct InMemoryResultLog {
    entries: HashMap<String, ResultLogEntry>,
}

impl InMemoryResultLog {
    pub fn new() -> Self {
        InMemoryResultLog { entries: HashMap::new() }
    }
}

impl ResultLogSource for InMemoryResultLog {
    fn find(&self, key: &str) -> Option<ResultLogEntry> {
        self.entries.get(key).cloned()
    }

    fn append(&mut self, entry: ResultLogEntry) -> Result<(), IoError> {
        self.entries.insert(entry.key.clone(), entry);
        Ok(())
    }
}

/// Append-only JSON-lines log on disk; `find` re-reads the file so a
/// fresh process picks up a prior run's history.
pub struct FileResultLog {
    path: PathBuf,
}

impl FileResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileResultLog { path: path.into() }
    }

    fn read_all(&self) -> Result<Vec<ResultLogEntry>, IoError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let text = std::fs::read_to_string(&self.path).map_err(|source| IoError::Read { path: self.path.clone(), source })?;
        let mut out = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: ResultLogEntry = serde_json::from_str(line)
                .map_err(|source| IoError::Malformed { path: self.path.clone(), source })?;
            out.push(entry);
        }
        Ok(out)
    }
}

impl ResultLogSource for FileResultLog {
    fn find(&self, key: &str) -> Option<ResultLogEntry> {
        self.read_all().ok()?.into_iter().rev().find(|e| e.key == key)
    }

    fn append(&mut self, entry: ResultLogEntry) -> Result<(), IoError> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| IoError::Write { path: self.path.clone(), source })?;
        let line = serde_json::to_string(&entry).expect("ResultLogEntry always serializes");
        writeln!(file, "{line}").map_err(|source| IoError::Write { path: self.path.clone(), source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_log_round_trips_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let mut log = FileResultLog::new(&path);
        log.append(ResultLogEntry { key: "suite/p#0".into(), status: "passed".into() }).unwrap();

        let reopened = FileResultLog::new(&path);
        assert_eq!(reopened.find("suite/p#0").unwrap().status, "passed");
        assert!(reopened.find("nope").is_none());
    }
}
