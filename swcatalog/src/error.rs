//! Error classification shared by every module.
//!
//! Each module has its own error enum; all of them map onto one of these kinds
//! so callers can apply a uniform fatal/non-fatal policy.

use std::fmt;

/// Broad category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Transport or HTTP-level failure.
    Network,
    /// Malformed manifest, descriptor or XML.
    Parse,
    /// No matching product, or no catalog URL for the host version.
    NotFound,
    /// Both mirror and origin fetch failed for one asset.
    Replication,
    /// The external install step failed.
    Install,
    /// The run was stopped by an external signal.
    Cancelled,
}

impl ErrorKind {
    /// Whether a failure of this kind must stop the run.
    ///
    /// Replication failures are per-asset and are recovered from by the
    /// orchestrator; everything else reaching the top level is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, ErrorKind::Replication)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Network => "network error",
            ErrorKind::Parse => "parse error",
            ErrorKind::NotFound => "not found",
            ErrorKind::Replication => "replication error",
            ErrorKind::Install => "install error",
            ErrorKind::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replication_is_not_fatal() {
        assert!(!ErrorKind::Replication.is_fatal());
        assert!(ErrorKind::NotFound.is_fatal());
        assert!(ErrorKind::Parse.is_fatal());
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not found");
    }
}
