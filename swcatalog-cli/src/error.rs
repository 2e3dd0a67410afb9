//! CLI error type and exit codes.

use std::fmt;

use swcatalog::config::ConfigError;
use swcatalog::logging::LoggingError;
use swcatalog::orchestrator::RunError;
use swcatalog::replicate::ReplicationError;
use swcatalog::ErrorKind;

/// Exit code for configuration and setup failures.
pub const EXIT_CONFIG: i32 = 2;

/// Exit code when the run was interrupted.
pub const EXIT_CANCELLED: i32 = 130;

/// Errors surfaced to the user by the CLI.
#[derive(Debug)]
pub enum CliError {
    /// Configuration file or argument problem.
    Config(String),
    /// Config file could not be read or written.
    ConfigFile(ConfigError),
    /// Logging could not be initialized.
    Logging(LoggingError),
    /// HTTP client could not be built.
    Client(ReplicationError),
    /// The pipeline failed.
    Run(RunError),
    /// The worker thread could not be started or panicked.
    Worker(String),
}

impl CliError {
    /// Process exit status for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::ConfigFile(_) | CliError::Logging(_) => EXIT_CONFIG,
            CliError::Run(e) if e.kind() == ErrorKind::Cancelled => EXIT_CANCELLED,
            _ => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "{}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Client(e) => write!(f, "HTTP client error: {}", e),
            CliError::Run(e) => write!(f, "{}", e),
            CliError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Client(e) => Some(e),
            CliError::Run(e) => Some(e),
            CliError::Config(_) | CliError::Worker(_) => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ReplicationError> for CliError {
    fn from(e: ReplicationError) -> Self {
        CliError::Client(e)
    }
}

impl From<RunError> for CliError {
    fn from(e: RunError) -> Self {
        CliError::Run(e)
    }
}
