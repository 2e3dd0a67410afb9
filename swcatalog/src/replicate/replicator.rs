//! Streaming one URL to disk with weighted progress.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reqwest::Url;
use tracing::{debug, info, warn};

use super::error::ReplicationError;
use super::paths::{file_name, is_mirrored_asset, local_path, mirror_url, parse_url};
use super::transport::{HttpTransport, Transport, TransportResponse};
use crate::context::RunContext;
use crate::progress::{format_size, DownloadProgress};

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// One download: where from, where to, and how much of the overall bar it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplicationTask {
    /// Authoritative URL.
    pub source: Url,
    /// Mirror URL tried first, when a mirror applies to this asset.
    pub mirror: Option<Url>,
    /// Local file the body is written to.
    pub destination: PathBuf,
    /// Fraction of overall progress this download represents.
    pub weight: f64,
}

impl ReplicationTask {
    /// Plan a download of `url` under `root`.
    ///
    /// The mirror is only used for package and disk image assets.
    pub fn new(
        url: &str,
        weight: f64,
        root: &Path,
        mirror: Option<&str>,
    ) -> Result<Self, ReplicationError> {
        let source = parse_url(url)?;
        let destination = local_path(&source, root);
        let mirror = match mirror {
            Some(host) if is_mirrored_asset(&source) => Some(mirror_url(&source, host)?),
            _ => None,
        };

        Ok(Self {
            source,
            mirror,
            destination,
            weight,
        })
    }

    /// File name shown in status text.
    pub fn file_name(&self) -> String {
        file_name(&self.source)
    }
}

/// Replicates remote assets into a local directory tree.
#[derive(Clone)]
pub struct AssetReplicator {
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for AssetReplicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssetReplicator").finish_non_exhaustive()
    }
}

impl AssetReplicator {
    /// Create a replicator over any transport.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Create a replicator using the HTTP transport.
    pub fn http(user_agent: &str) -> Result<Self, ReplicationError> {
        Ok(Self::new(Arc::new(HttpTransport::new(user_agent)?)))
    }

    /// Download `url` to the same path under `root` and return the local path.
    ///
    /// `weight` is the fraction of overall progress this file owns. When
    /// `mirror` is set and the URL is a package or disk image, the mirror is
    /// tried first and the origin exactly once more if the mirror fails.
    pub fn replicate(
        &self,
        ctx: &RunContext,
        url: &str,
        weight: f64,
        root: &Path,
        mirror: Option<&str>,
    ) -> Result<PathBuf, ReplicationError> {
        let task = ReplicationTask::new(url, weight, root, mirror)?;
        self.run(ctx, &task)
    }

    /// Execute a planned download.
    pub fn run(&self, ctx: &RunContext, task: &ReplicationTask) -> Result<PathBuf, ReplicationError> {
        let name = task.file_name();

        if let Some(parent) = task.destination.parent() {
            fs::create_dir_all(parent).map_err(|e| ReplicationError::CreateDir {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        ctx.stage_text(format!("Downloading {}...", name));
        let response = self.open(task)?;

        let mut progress = DownloadProgress::new(response.content_length, task.weight);
        let partial = partial_path(&task.destination);
        if let Err(e) = self.stream(ctx, task, &name, response, &mut progress, &partial) {
            if let Err(remove) = fs::remove_file(&partial) {
                debug!(path = %partial.display(), error = %remove, "Could not remove partial file");
            }
            return Err(e);
        }
        fs::rename(&partial, &task.destination).map_err(|e| ReplicationError::Write {
            path: task.destination.clone(),
            source: e,
        })?;

        let last = progress.finish();
        ctx.stage_progress(last.stage);
        if last.overall > 0.0 {
            ctx.overall_progress(last.overall);
        }
        ctx.stage_text(format!("Downloading {} Complete.", name));
        info!(
            path = %task.destination.display(),
            bytes = progress.bytes_written(),
            "Replicated"
        );

        Ok(task.destination.clone())
    }

    /// Open the response, falling back from mirror to origin once.
    fn open(&self, task: &ReplicationTask) -> Result<TransportResponse, ReplicationError> {
        let Some(ref mirror) = task.mirror else {
            debug!(url = %task.source, "Downloading");
            return self.transport.get(task.source.as_str());
        };

        debug!(url = %mirror, "Downloading through mirror");
        match self.transport.get(mirror.as_str()) {
            Ok(response) => Ok(response),
            Err(mirror_error) => {
                warn!(
                    error = %mirror_error,
                    origin = %task.source,
                    "Mirror failed, retrying from origin"
                );
                self.transport
                    .get(task.source.as_str())
                    .map_err(|e| ReplicationError::FallbackFailed {
                        mirror_error: mirror_error.to_string(),
                        source: Box::new(e),
                    })
            }
        }
    }

    fn stream(
        &self,
        ctx: &RunContext,
        task: &ReplicationTask,
        name: &str,
        mut response: TransportResponse,
        progress: &mut DownloadProgress,
        dest: &Path,
    ) -> Result<(), ReplicationError> {
        let file = File::create(dest).map_err(|e| ReplicationError::Write {
            path: dest.to_path_buf(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = response
                .body
                .read(&mut buffer)
                .map_err(|e| ReplicationError::Read {
                    url: task.source.to_string(),
                    source: e,
                })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| ReplicationError::Write {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            if let Some(delta) = progress.record(bytes_read as u64) {
                if let Some(total) = progress.total() {
                    ctx.stage_text(format!(
                        "Downloading {}   {} of {}",
                        name,
                        format_size(progress.bytes_written()),
                        format_size(total)
                    ));
                }
                ctx.stage_progress(delta.stage);
                ctx.overall_progress(delta.overall);
            }
        }

        writer.flush().map_err(|e| ReplicationError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
    }
}

/// Sibling file a download streams into before it is moved into place.
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = destination.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    destination.with_file_name(name)
}
