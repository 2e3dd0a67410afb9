//! Errors for asset replication.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;

/// Failure replicating one URL to disk.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Client(String),

    /// The URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The request could not be sent or the connection failed.
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    /// The server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed reading response from {url}: {source}")]
    Read {
        url: String,
        #[source]
        source: io::Error,
    },

    /// The mirror failed and so did the single fallback to origin.
    #[error("mirror failed ({mirror_error}) and origin fetch failed: {source}")]
    FallbackFailed {
        mirror_error: String,
        #[source]
        source: Box<ReplicationError>,
    },

    /// A destination directory could not be created.
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The destination file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReplicationError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ReplicationError::Client(_)
            | ReplicationError::Request { .. }
            | ReplicationError::Status { .. }
            | ReplicationError::Read { .. } => ErrorKind::Network,
            ReplicationError::InvalidUrl { .. } => ErrorKind::Parse,
            ReplicationError::FallbackFailed { .. }
            | ReplicationError::CreateDir { .. }
            | ReplicationError::Write { .. } => ErrorKind::Replication,
        }
    }
}
