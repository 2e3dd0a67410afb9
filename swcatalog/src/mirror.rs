//! Content caching server discovery.
//!
//! macOS exposes the caching servers on the local network through
//! `AssetCacheLocatorUtil --json`. The shared caching server with the lowest
//! rank is used as the mirror.

use std::process::Command;

use serde::Deserialize;
use tracing::{debug, info};

const LOCATOR_COMMAND: &str = "AssetCacheLocatorUtil";

#[derive(Debug, Deserialize)]
struct LocatorOutput {
    results: LocatorResults,
}

#[derive(Debug, Deserialize)]
struct LocatorResults {
    system: LocatorSystem,
}

#[derive(Debug, Deserialize)]
struct LocatorSystem {
    #[serde(rename = "refreshed servers")]
    refreshed_servers: RefreshedServers,
}

#[derive(Debug, Deserialize)]
struct RefreshedServers {
    #[serde(rename = "shared caching", default)]
    shared_caching: Vec<CachingServer>,
}

#[derive(Debug, Deserialize)]
struct CachingServer {
    hostport: String,
    #[serde(default)]
    rank: i64,
}

/// Pick the best shared caching server from locator JSON output.
///
/// Returns `None` when the output is malformed or lists no server.
pub fn parse_cache_locator_json(json: &str) -> Option<String> {
    let output: LocatorOutput = match serde_json::from_str(json) {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "Unrecognised cache locator output");
            return None;
        }
    };

    output
        .results
        .system
        .refreshed_servers
        .shared_caching
        .into_iter()
        .min_by_key(|server| server.rank)
        .map(|server| server.hostport)
}

/// Ask the host for a caching mirror. Any failure means "no mirror".
pub fn discover_mirror() -> Option<String> {
    let output = match Command::new(LOCATOR_COMMAND).arg("--json").output() {
        Ok(output) => output,
        Err(e) => {
            debug!(error = %e, "Cache locator not available");
            return None;
        }
    };

    let mirror = parse_cache_locator_json(&String::from_utf8_lossy(&output.stdout));
    match mirror {
        Some(ref hostport) => info!(mirror = %hostport, "Found caching server"),
        None => debug!("No caching server found"),
    }
    mirror
}
