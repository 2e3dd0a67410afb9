//! Catalog errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;
use crate::replicate::ReplicationError;

/// Failure obtaining or reading the root catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// No override was given and the host version has no known catalog.
    #[error("no default catalog URL for Darwin version {}", display_major(.darwin_major))]
    NoDefaultCatalog { darwin_major: Option<u32> },

    /// The catalog could not be downloaded.
    #[error("failed to download catalog: {0}")]
    Fetch(#[from] ReplicationError),

    /// The catalog file could not be read.
    #[error("failed to read catalog {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A `.gz` catalog could not be decompressed.
    #[error("failed to decompress catalog {}: {source}", path.display())]
    Decompress {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The catalog is not a valid property list.
    #[error("malformed catalog: {0}")]
    Malformed(#[source] plist::Error),
}

fn display_major(major: &Option<u32>) -> String {
    major.map_or_else(|| "unknown".to_string(), |m| m.to_string())
}

impl CatalogError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::NoDefaultCatalog { .. } => ErrorKind::NotFound,
            CatalogError::Fetch(_) => ErrorKind::Network,
            CatalogError::Read { .. }
            | CatalogError::Decompress { .. }
            | CatalogError::Malformed(_) => ErrorKind::Parse,
        }
    }
}
