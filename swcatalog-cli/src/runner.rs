//! Shared setup for commands that talk to the catalog.

use std::path::PathBuf;

use swcatalog::config::{ConfigFile, RunConfig};
use swcatalog::logging::{init_logging, LoggingGuard};
use swcatalog::orchestrator::ReplicationOrchestrator;
use swcatalog::replicate::AssetReplicator;
use tracing::info;

use crate::error::CliError;

/// Loaded config file plus the logging guard for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load the config file and start logging.
    ///
    /// The log directory is `log_dir`, else the config file's, else the
    /// built-in default.
    pub fn new(log_dir: Option<PathBuf>, verbose: bool) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let log_dir = log_dir
            .or_else(|| config.log_dir.clone())
            .unwrap_or_else(swcatalog::config::default_log_dir);
        let logging = init_logging(&log_dir, verbose)?;

        Ok(Self {
            config,
            _logging: logging,
        })
    }

    /// Config file values layered over the defaults.
    pub fn run_config(&self) -> RunConfig {
        self.config.to_run_config()
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = swcatalog::VERSION,
            command,
            config = %swcatalog::config::config_file_path().display(),
            "swcatalog starting"
        );
    }

    /// Orchestrator downloading over HTTP with the configured user agent.
    pub fn orchestrator(&self, config: &RunConfig) -> Result<ReplicationOrchestrator, CliError> {
        let replicator = AssetReplicator::http(&config.user_agent)?;
        Ok(ReplicationOrchestrator::new(replicator))
    }
}
