//! Per-product descriptor documents.
//!
//! Failures here never stop a run. The `parse_*` functions log and return an
//! empty result; the `try_parse_*` variants expose the error for callers that
//! want it.

mod distribution;
mod server_metadata;
mod tree;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::error::ErrorKind;

pub use distribution::{parse_distribution, try_parse_distribution, DistributionInfo};
pub use server_metadata::{parse_server_metadata, try_parse_server_metadata, ServerMetadata};

/// Failure reading a descriptor document.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid XML in {}: {reason}", path.display())]
    Xml { path: PathBuf, reason: String },

    #[error("invalid property list {}: {source}", path.display())]
    Plist {
        path: PathBuf,
        #[source]
        source: plist::Error,
    },
}

impl DescriptorError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::Parse
    }
}
