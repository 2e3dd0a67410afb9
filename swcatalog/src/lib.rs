//! swcatalog - resolve and replicate macOS installer releases.
//!
//! This library reads an Apple software update catalog, picks the installer
//! product that matches a requested version (filtering out products that do not
//! support the current machine), and mirrors every package of that product to
//! local disk while reporting weighted two-level progress.
//!
//! # Pipeline
//!
//! ```text
//! CatalogStore ──► DescriptorParser ──► ProductResolver
//!                                             │
//!                                             ▼
//!                                   ReplicationOrchestrator
//!                                             │
//!                                             ▼
//!                                      AssetReplicator ──► RunEvent channel ──► sink
//! ```
//!
//! The whole pipeline runs on one worker thread (see [`orchestrator::spawn_worker`]).
//! The only thing shared with the consuming side is the [`events`] channel.

pub mod catalog;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod error;
pub mod events;
pub mod host;
pub mod install;
pub mod logging;
pub mod mirror;
pub mod orchestrator;
pub mod progress;
pub mod replicate;
pub mod resolve;

pub use error::ErrorKind;

/// Crate version, shown in CLI banners and the startup log line.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
