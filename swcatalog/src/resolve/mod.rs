//! Selecting one product among the compatible installers.

mod version;

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::catalog::Product;
use crate::descriptor::{DistributionInfo, ServerMetadata};
use crate::error::ErrorKind;

pub use version::VersionKey;

/// Resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No product matches the requested token.
    #[error("unable to find target version: {target}")]
    NotFound { target: String },

    /// There were no products to choose from.
    #[error("no installer products to choose from")]
    NoCandidates,
}

impl ResolveError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::NotFound
    }
}

/// Display-ready view of one candidate product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductInfo {
    pub id: String,
    pub title: String,
    pub version: String,
    pub post_date: Option<DateTime<Utc>>,
    /// Local copy of the distribution document.
    pub distribution_path: Option<PathBuf>,
    /// Machine models this product does not support.
    pub compatibility: Vec<String>,
    pub aux_info: BTreeMap<String, String>,
}

impl ProductInfo {
    /// Combine a catalog product with its parsed descriptors.
    pub fn from_parts(
        product: &Product,
        metadata: ServerMetadata,
        distribution: DistributionInfo,
        distribution_path: Option<PathBuf>,
    ) -> Self {
        Self {
            id: product.id.clone(),
            title: metadata.title,
            version: metadata.version,
            post_date: product.post_date,
            distribution_path,
            compatibility: distribution.compatibility,
            aux_info: distribution.aux_info,
        }
    }

    /// Whether `target` selects this product: a substring of the version, or
    /// a case-insensitive substring of the title.
    pub fn matches(&self, target: &str) -> bool {
        self.version.contains(target) || self.title.to_lowercase().contains(&target.to_lowercase())
    }

    /// `"<title> <version> - Dated: MM-DD-YYYY"`.
    pub fn label(&self) -> String {
        let dated = self
            .post_date
            .map(|d| d.format("%m-%d-%Y").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        format!("{} {} - Dated: {}", self.title, self.version, dated)
    }

    /// Product id as a number, ignoring separators; `None` if it has no digits
    /// or does not fit.
    fn numeric_id(&self) -> Option<u128> {
        let digits: String = self.id.chars().filter(char::is_ascii_digit).collect();
        digits.parse().ok()
    }
}

/// Pick the product matching `target`.
///
/// Among several matches the numerically largest id wins, then the latest
/// post date, then the id string, so the result does not depend on input
/// order.
pub fn resolve<'a, I>(infos: I, target: &str) -> Result<String, ResolveError>
where
    I: IntoIterator<Item = &'a ProductInfo>,
{
    let selected = infos
        .into_iter()
        .filter(|info| info.matches(target))
        .max_by(|a, b| {
            a.numeric_id()
                .cmp(&b.numeric_id())
                .then_with(|| a.post_date.cmp(&b.post_date))
                .then_with(|| a.id.cmp(&b.id))
        });

    match selected {
        Some(info) => {
            debug!(id = %info.id, target, "Resolved product");
            Ok(info.id.clone())
        }
        None => Err(ResolveError::NotFound {
            target: target.to_string(),
        }),
    }
}

/// Highest version string among `infos`, compared numerically.
pub fn latest_version<'a, I>(infos: I) -> Result<String, ResolveError>
where
    I: IntoIterator<Item = &'a ProductInfo>,
{
    infos
        .into_iter()
        .map(|info| &info.version)
        .max_by_key(|version| VersionKey::new(version))
        .cloned()
        .ok_or(ResolveError::NoCandidates)
}

/// Label of product `id`, e.g. `"macOS Mojave 10.14 - Dated: 12-12-2018"`.
pub fn version_label(infos: &BTreeMap<String, ProductInfo>, id: &str) -> Option<String> {
    infos.get(id).map(ProductInfo::label)
}
