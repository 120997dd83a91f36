//! Config-tree and result-log loading collaborators: JSON-backed stand-ins
//! for the real XML config and on-disk log formats, which are out of
//! scope. Depends only on `tester_core`.

pub mod config_source;
pub mod error;
pub mod json_config;
pub mod result_log;

pub use config_source::{ConfigSource, StaticConfigSource};
pub use error::IoError;
pub use json_config::JsonConfigSource;
pub use result_log::{FileResultLog, InMemoryResultLog, ResultLogEntry, ResultLogSource};
