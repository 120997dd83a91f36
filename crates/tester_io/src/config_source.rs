//! Collaborator boundary for loading a named package's config tree.
//!
//! The orchestrator core never reads a config file directly; it calls a
//! `ConfigSource`. Production wiring is the JSON-backed loader in
//! `json_config`, standing in for the real XML config format (out of
//! scope); tests substitute an in-memory source built straight from
//! `tester_core` types.

use tester_core::Config;

use crate::error::IoError;

pub trait ConfigSource {
    /// Load the named package, numbered and ready to walk.
    fn load(&self, package: &str) -> Result<Config, IoError>;

    /// List packages this source can resolve, in declaration order.
    fn package_names(&self) -> Result<Vec<String>, IoError>;
}

/// A `ConfigSource` built directly from already-constructed `Config`s,
/// useful for tests and for embedding a fixed suite in a binary.
#[derive(Default)]
pub struct StaticConfigSource {
    packages: Vec<(String, Config)>,
}

impl StaticConfigSource {
    pub fn new() -> Self {
        StaticConfigSource { packages: Vec::new() }
    }

    pub fn with_package(mut self, name: impl Into<String>, config: Config) -> Self {
        self.packages.push((name.into(), config));
        self
    }
}

impl ConfigSource for StaticConfigSource {
    fn load(&self, package: &str) -> Result<Config, IoError> {
        self.packages
            .iter()
            .find(|(n, _)| n == package)
            .map(|(_, c)| c.clone())
            .ok_or_else(|| IoError::PackageNotFound { name: package.to_string(), root: "<static>".into() })
    }

    fn package_names(&self) -> Result<Vec<String>, IoError> {
        Ok(self.packages.iter().map(|(n, _)| n.clone()).collect())
    }
}
