//! Outcome of replicating one product's packages.

use std::path::PathBuf;

/// Tracks which assets of a product were replicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplicationReport {
    /// Number of assets attempted.
    pub attempted: usize,
    /// Local paths of the assets replicated.
    pub replicated: Vec<PathBuf>,
    /// URLs that could not be replicated.
    pub failed: Vec<String>,
}

impl ReplicationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every attempted asset was replicated.
    pub fn is_complete(&self) -> bool {
        self.replicated.len() == self.attempted && self.failed.is_empty()
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn record_success(&mut self, path: PathBuf) {
        self.attempted += 1;
        self.replicated.push(path);
    }

    pub fn record_failure(&mut self, url: impl Into<String>) {
        self.attempted += 1;
        self.failed.push(url.into());
    }
}
