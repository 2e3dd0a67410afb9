//! Run configuration.
//!
//! [`RunConfig`] is the in-memory configuration every component reads through
//! the [`RunContext`](crate::context::RunContext). It is assembled by the CLI
//! from, in order of precedence: command-line arguments, the INI config file
//! ([`ConfigFile`]), and the defaults below.

mod catalogs;
mod file;

pub use catalogs::{default_catalog_url, DEFAULT_CATALOGS};
pub use file::{config_file_path, ConfigError, ConfigFile};

use std::path::PathBuf;
use std::time::Duration;

/// User agent required by Apple's software update service.
pub const DEFAULT_USER_AGENT: &str =
    "MacAppStore/3.0 (Macintosh; OS X 10.14.3; 18D109) AppleWebKit/14606.4.5";

/// How long a fatal error stays on screen before the process exits.
pub const DEFAULT_ERROR_GRACE_SECS: u64 = 10;

/// Default working directory for replicated files.
pub fn default_workdir() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/private/tmp")
    } else {
        std::env::temp_dir()
    }
}

/// Default directory for rotated log files.
pub fn default_log_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("swcatalog")
        .join("logs")
}

/// Configuration for one run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Catalog URL; `None` selects the default for the host OS version.
    pub catalog_url: Option<String>,

    /// Root directory that replicated URL paths are mirrored under.
    pub workdir: PathBuf,

    /// Caching mirror `host:port` (optionally with a scheme).
    pub mirror: Option<String>,

    /// Ask the host's cache locator for a mirror when none is configured.
    pub discover_mirror: bool,

    /// Version or title token to select; `None` selects the latest version.
    pub target_version: Option<String>,

    /// Machine model override; `None` asks the host.
    pub machine_model: Option<String>,

    /// User agent sent with every request.
    pub user_agent: String,

    /// Delay before exiting after a fatal error.
    pub error_grace: Duration,

    /// Stop after the install hand-off instead of waiting for completion.
    pub installer_only: bool,

    /// Directory for rotated log files.
    pub log_dir: PathBuf,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            catalog_url: None,
            workdir: default_workdir(),
            mirror: None,
            discover_mirror: true,
            target_version: None,
            machine_model: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            error_grace: Duration::from_secs(DEFAULT_ERROR_GRACE_SECS),
            installer_only: false,
            log_dir: default_log_dir(),
        }
    }
}

impl RunConfig {
    /// Create a configuration replicating into `workdir`.
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            ..Default::default()
        }
    }

    /// Use an explicit catalog URL.
    pub fn with_catalog_url(mut self, url: impl Into<String>) -> Self {
        self.catalog_url = Some(url.into());
        self
    }

    /// Use a caching mirror.
    pub fn with_mirror(mut self, hostport: impl Into<String>) -> Self {
        self.mirror = Some(hostport.into());
        self
    }

    /// Enable or disable mirror discovery.
    pub fn with_discover_mirror(mut self, discover: bool) -> Self {
        self.discover_mirror = discover;
        self
    }

    /// Select products by version or title token.
    pub fn with_target_version(mut self, target: impl Into<String>) -> Self {
        self.target_version = Some(target.into());
        self
    }

    /// Override the machine model used for compatibility filtering.
    pub fn with_machine_model(mut self, model: impl Into<String>) -> Self {
        self.machine_model = Some(model.into());
        self
    }

    /// Set the user agent.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the fatal-error grace period.
    pub fn with_error_grace(mut self, grace: Duration) -> Self {
        self.error_grace = grace;
        self
    }

    /// Stop after the install hand-off.
    pub fn with_installer_only(mut self, installer_only: bool) -> Self {
        self.installer_only = installer_only;
        self
    }

    /// Set the log directory.
    pub fn with_log_dir(mut self, dir: PathBuf) -> Self {
        self.log_dir = dir;
        self
    }
}
