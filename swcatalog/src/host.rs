//! Host inspection: machine model and Darwin version.

use std::process::Command;

use tracing::warn;

/// Source of the opaque machine model string (e.g. `MacBookPro15,1`).
pub trait MachineIdentity: Send + Sync {
    /// The machine model, or `None` when it cannot be determined.
    fn model(&self) -> Option<String>;
}

/// Reads the model from `sysctl -n hw.model`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostMachine;

impl MachineIdentity for HostMachine {
    fn model(&self) -> Option<String> {
        let output = match Command::new("sysctl").args(["-n", "hw.model"]).output() {
            Ok(output) if output.status.success() => output,
            Ok(output) => {
                warn!(status = %output.status, "sysctl hw.model failed");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Could not run sysctl");
                return None;
            }
        };

        let model = String::from_utf8_lossy(&output.stdout).trim().to_string();
        (!model.is_empty()).then_some(model)
    }
}

/// A fixed machine model.
#[derive(Debug, Clone)]
pub struct StaticMachine(pub String);

impl StaticMachine {
    pub fn new(model: impl Into<String>) -> Self {
        Self(model.into())
    }
}

impl MachineIdentity for StaticMachine {
    fn model(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

/// Major Darwin version of the running kernel, from `uname -r`.
pub fn host_darwin_major() -> Option<u32> {
    let output = Command::new("uname").arg("-r").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_darwin_major(&String::from_utf8_lossy(&output.stdout))
}

/// Parse the major component of a kernel release such as `19.6.0`.
pub fn parse_darwin_major(release: &str) -> Option<u32> {
    release.trim().split('.').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_darwin_major() {
        assert_eq!(parse_darwin_major("19.6.0\n"), Some(19));
        assert_eq!(parse_darwin_major("23.1.0"), Some(23));
        assert_eq!(parse_darwin_major("6.1.0-generic"), Some(6));
        assert_eq!(parse_darwin_major(""), None);
        assert_eq!(parse_darwin_major("abc"), None);
    }

    #[test]
    fn test_static_machine() {
        let machine = StaticMachine::new("MacBookAir5,1");
        assert_eq!(machine.model().as_deref(), Some("MacBookAir5,1"));
    }
}
