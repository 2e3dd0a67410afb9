//! Fetching and parsing the root catalog.

use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use super::error::CatalogError;
use super::types::{Catalog, RawCatalog};
use crate::config::{default_catalog_url, RunConfig};
use crate::context::RunContext;
use crate::progress::CATALOG_WEIGHT;
use crate::replicate::AssetReplicator;

/// Owns the catalog download for a run.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    replicator: AssetReplicator,
}

impl CatalogStore {
    /// Create a store downloading through `replicator`.
    pub fn new(replicator: AssetReplicator) -> Self {
        Self { replicator }
    }

    /// The catalog URL for this run: the configured override, or the known
    /// catalog for `darwin_major`. There is no fallback.
    pub fn catalog_url(
        config: &RunConfig,
        darwin_major: Option<u32>,
    ) -> Result<String, CatalogError> {
        if let Some(ref url) = config.catalog_url {
            return Ok(url.clone());
        }

        darwin_major
            .and_then(default_catalog_url)
            .map(str::to_string)
            .ok_or(CatalogError::NoDefaultCatalog { darwin_major })
    }

    /// Download and parse the catalog at `url`.
    pub fn load_catalog(&self, ctx: &RunContext, url: &str) -> Result<Catalog, CatalogError> {
        debug!(url, "Downloading catalog");
        let path = self
            .replicator
            .replicate(ctx, url, CATALOG_WEIGHT, &ctx.config().workdir, None)?;

        let catalog = parse_catalog_file(&path)?;
        info!(products = catalog.products.len(), "Parsed catalog");
        Ok(catalog)
    }
}

/// Parse a catalog file, decompressing it first when it ends in `.gz`.
pub fn parse_catalog_file(path: &Path) -> Result<Catalog, CatalogError> {
    let raw = fs::read(path).map_err(|e| CatalogError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;

    let is_gzip = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("gz"))
        .unwrap_or(false);

    if is_gzip {
        let mut content = Vec::new();
        GzDecoder::new(raw.as_slice())
            .read_to_end(&mut content)
            .map_err(|e| CatalogError::Decompress {
                path: path.to_path_buf(),
                source: e,
            })?;
        parse_catalog(&content)
    } else {
        parse_catalog(&raw)
    }
}

/// Parse catalog plist bytes (XML or binary).
pub fn parse_catalog(bytes: &[u8]) -> Result<Catalog, CatalogError> {
    let raw: RawCatalog = plist::from_bytes(bytes).map_err(CatalogError::Malformed)?;
    Ok(raw.into())
}

/// Ids of every full OS installer product, in ascending id order.
///
/// Products without the expected extended metadata are skipped.
pub fn find_installer_products(catalog: &Catalog) -> Vec<String> {
    catalog
        .products
        .values()
        .filter(|product| product.is_os_installer())
        .map(|product| product.id.clone())
        .collect()
}
