//! Hand-off to the external install step and the completion wait.
//!
//! Installing is not done here. An [`InstallStep`] receives the replicated
//! files and reports success or failure; a [`CompletionWaiter`] blocks until
//! some external party signals that the installation finished.

use std::io;
use std::path::PathBuf;
use std::process::Command;
use std::thread;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::context::RunContext;
use crate::error::ErrorKind;

/// Placeholder replaced with the distribution path in install commands.
pub const DIST_PLACEHOLDER: &str = "{dist}";

/// Install step failure.
#[derive(Debug, Error)]
pub enum InstallError {
    /// Some assets of the product were not replicated.
    #[error("{failed} asset(s) failed to replicate")]
    IncompleteReplication { failed: usize },

    /// The product has no local distribution document.
    #[error("product {product_id} has no distribution document")]
    NoDistribution { product_id: String },

    /// A replicated file is missing on disk.
    #[error("replicated file missing: {}", path.display())]
    MissingAsset { path: PathBuf },

    /// The install command is empty.
    #[error("install command is empty")]
    EmptyCommand,

    /// The install command could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    /// The install command exited unsuccessfully.
    #[error("{program} failed: {status}")]
    Failed { program: String, status: String },
}

impl InstallError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Install
    }
}

/// What the install step receives.
#[derive(Debug, Clone, PartialEq)]
pub struct InstallHandoff {
    pub product_id: String,
    /// Human-readable product label.
    pub label: String,
    /// Local distribution document of the product.
    pub distribution_path: Option<PathBuf>,
    /// Every file replicated for the product.
    pub replicated: Vec<PathBuf>,
}

impl InstallHandoff {
    fn require_distribution(&self) -> Result<&PathBuf, InstallError> {
        self.distribution_path
            .as_ref()
            .ok_or_else(|| InstallError::NoDistribution {
                product_id: self.product_id.clone(),
            })
    }
}

/// Consumes the replicated product.
pub trait InstallStep: Send + Sync {
    fn install(&self, ctx: &RunContext, handoff: &InstallHandoff) -> Result<(), InstallError>;

    /// Whether the step hands off to something that signals completion later.
    ///
    /// Only then does the run block on a [`CompletionWaiter`].
    fn awaits_completion(&self) -> bool {
        false
    }
}

/// Checks that every replicated file and the distribution document exist.
#[derive(Debug, Default, Clone, Copy)]
pub struct VerifyAssets;

impl InstallStep for VerifyAssets {
    fn install(&self, _ctx: &RunContext, handoff: &InstallHandoff) -> Result<(), InstallError> {
        let dist = handoff.require_distribution()?;
        for path in std::iter::once(dist).chain(handoff.replicated.iter()) {
            if !path.is_file() {
                return Err(InstallError::MissingAsset { path: path.clone() });
            }
        }
        info!(
            product = %handoff.product_id,
            files = handoff.replicated.len(),
            "All replicated files present"
        );
        Ok(())
    }
}

/// Runs a command, substituting [`DIST_PLACEHOLDER`] in its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInstall {
    command: Vec<String>,
    signals_completion: bool,
}

impl CommandInstall {
    /// Use `command` (program followed by arguments).
    pub fn new(command: Vec<String>) -> Self {
        Self {
            command,
            signals_completion: false,
        }
    }

    /// Wait for a completion signal after the command exits.
    pub fn with_completion_signal(mut self, signals_completion: bool) -> Self {
        self.signals_completion = signals_completion;
        self
    }

    /// `installer -pkg {dist} -target /`.
    pub fn system_installer() -> Self {
        Self::new(
            ["/usr/sbin/installer", "-pkg", DIST_PLACEHOLDER, "-target", "/"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    /// The command line with the placeholder substituted.
    pub fn command_line(&self, dist: &str) -> Vec<String> {
        self.command
            .iter()
            .map(|arg| arg.replace(DIST_PLACEHOLDER, dist))
            .collect()
    }
}

impl InstallStep for CommandInstall {
    fn install(&self, ctx: &RunContext, handoff: &InstallHandoff) -> Result<(), InstallError> {
        let dist = handoff.require_distribution()?.display().to_string();
        let command_line = self.command_line(&dist);
        let (program, args) = command_line.split_first().ok_or(InstallError::EmptyCommand)?;

        ctx.stage_text(format!("Running {}...", program));
        debug!(command = ?command_line, "Starting install command");

        let status = Command::new(program)
            .args(args)
            .status()
            .map_err(|e| InstallError::Spawn {
                program: program.clone(),
                source: e,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(InstallError::Failed {
                program: program.clone(),
                status: status.to_string(),
            })
        }
    }

    fn awaits_completion(&self) -> bool {
        self.signals_completion
    }
}

/// Blocks until the external installation signals completion.
pub trait CompletionWaiter: Send + Sync {
    fn wait(&self, ctx: &RunContext);
}

/// Waits for the run's `running` flag to be cleared, e.g. by a signal handler.
#[derive(Debug, Clone, Copy)]
pub struct FlagCompletion {
    poll_interval: Duration,
}

impl Default for FlagCompletion {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}

impl FlagCompletion {
    pub fn new(poll_interval: Duration) -> Self {
        Self { poll_interval }
    }
}

impl CompletionWaiter for FlagCompletion {
    fn wait(&self, ctx: &RunContext) {
        while ctx.is_running() {
            thread::sleep(self.poll_interval);
        }
        info!("Completion signal received");
    }
}
