//! Errors surfaced while preparing and walking a config.

use tester_algo::AlgoError;
use tester_core::CoreError;

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Algo(#[from] AlgoError),

    #[error("config backup failed: {0}")]
    Backup(String),

    #[error("script runner failed: {0}")]
    Runner(String),
}
