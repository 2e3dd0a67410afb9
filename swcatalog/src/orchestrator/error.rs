//! Run-level errors.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::error::ErrorKind;
use crate::install::InstallError;
use crate::replicate::ReplicationError;
use crate::resolve::ResolveError;

/// Why a run stopped.
#[derive(Debug, Error)]
pub enum RunError {
    /// The catalog could not be obtained.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// The catalog lists no installer compatible with this machine.
    #[error("no macOS installer products found in the catalog")]
    NoInstallerProducts,

    /// No product could be selected.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// The downloader could not be set up.
    #[error(transparent)]
    Replication(#[from] ReplicationError),

    /// The install step failed after the re-fetch.
    #[error("unable to create installer: {0}")]
    Install(#[from] InstallError),

    /// The run was stopped before finishing.
    #[error("run cancelled")]
    Cancelled,
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Catalog(e) => e.kind(),
            RunError::NoInstallerProducts => ErrorKind::NotFound,
            RunError::Resolve(e) => e.kind(),
            RunError::Replication(e) => e.kind(),
            RunError::Install(e) => e.kind(),
            RunError::Cancelled => ErrorKind::Cancelled,
        }
    }
}
