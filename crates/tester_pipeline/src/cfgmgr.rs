//! Configuration-backup discipline around an iteration: create, verify,
//! restore, release. Concrete device/agent backends live in `tester_cli`;
//! tests use the in-memory fake here.

use crate::error::PipelineError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct BackupHandle(pub u64);

pub trait ConfigManager {
    fn backup(&mut self) -> Result<BackupHandle, PipelineError>;
    /// `Ok(true)` if the live configuration still matches the backup.
    fn verify(&mut self, handle: BackupHandle) -> Result<bool, PipelineError>;
    fn restore(&mut self, handle: BackupHandle) -> Result<(), PipelineError>;
    fn release(&mut self, handle: BackupHandle) -> Result<(), PipelineError>;
}

/// A backend that never drifts: `backup`/`release` are no-ops and
/// `verify` always reports clean. Used when `track_conf == No`, and in
/// tests that don't exercise the backup discipline.
#[derive(Default)]
pub struct NoopConfigManager {
    next: u64,
}

impl ConfigManager for NoopConfigManager {
    fn backup(&mut self) -> Result<BackupHandle, PipelineError> {
        self.next += 1;
        Ok(BackupHandle(self.next))
    }

    fn verify(&mut self, _handle: BackupHandle) -> Result<bool, PipelineError> {
        Ok(true)
    }

    fn restore(&mut self, _handle: BackupHandle) -> Result<(), PipelineError> {
        Ok(())
    }

    fn release(&mut self, _handle: BackupHandle) -> Result<(), PipelineError> {
        Ok(())
    }
}

/// Records drift on demand; used to test the `Dirty` reducer path.
#[derive(Default)]
pub struct DriftingConfigManager {
    next: u64,
    pub dirty_handles: std::collections::HashSet<u64>,
}

impl DriftingConfigManager {
    pub fn mark_dirty_next(&mut self) {
        self.dirty_handles.insert(self.next + 1);
    }
}

impl ConfigManager for DriftingConfigManager {
    fn backup(&mut self) -> Result<BackupHandle, PipelineError> {
        self.next += 1;
        Ok(BackupHandle(self.next))
    }

    fn verify(&mut self, handle: BackupHandle) -> Result<bool, PipelineError> {
        Ok(!self.dirty_handles.contains(&handle.0))
    }

    fn restore(&mut self, handle: BackupHandle) -> Result<(), PipelineError> {
        self.dirty_handles.remove(&handle.0);
        Ok(())
    }

    fn release(&mut self, _handle: BackupHandle) -> Result<(), PipelineError> {
        Ok(())
    }
}
