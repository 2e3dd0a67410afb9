//! Asset replication: mirror a remote URL's path under a local root.
//!
//! ```text
//! http://swcdn.apple.com/content/downloads/x/InstallAssistant.pkg
//!   └─► <root>/content/downloads/x/InstallAssistant.pkg
//! ```
//!
//! Packages and disk images are fetched through a caching mirror when one is
//! configured, with a single fallback to the origin. Progress is reported on
//! the run's event channel as the body streams in.

mod error;
mod paths;
mod replicator;
mod transport;

pub use error::ReplicationError;
pub use paths::{is_mirrored_asset, local_path, mirror_url};
pub use replicator::{AssetReplicator, ReplicationTask};
pub use transport::{HttpTransport, Transport, TransportResponse};

#[cfg(test)]
pub(crate) use transport::mock;
