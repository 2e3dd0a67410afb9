//! Catalog data model and the plist decode step.
//!
//! The catalog is decoded into private `Raw*` shapes that mirror the plist
//! keys, then converted once into the public types. Nothing downstream looks
//! at plist keys.

use std::collections::BTreeMap;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

/// `OSInstall` package identifier marking a full OS installer product.
pub const OS_INSTALL_IDENTIFIER: &str = "com.apple.mpkg.OSInstall";

/// Distribution locales tried in order.
const DISTRIBUTION_LOCALES: &[&str] = &["English", "en"];

/// The root software update manifest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    /// Products keyed by product id.
    pub products: BTreeMap<String, Product>,
}

impl Catalog {
    /// Look up a product by id.
    pub fn product(&self, id: &str) -> Option<&Product> {
        self.products.get(id)
    }
}

/// One releasable unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Product {
    /// Opaque product id, e.g. `061-26578`.
    pub id: String,
    /// When the product was posted.
    pub post_date: Option<DateTime<Utc>>,
    /// Downloadable files, in manifest order.
    pub packages: Vec<Package>,
    /// Distribution document URLs keyed by locale.
    pub distributions: BTreeMap<String, String>,
    /// Server metadata document URL.
    pub server_metadata_url: Option<String>,
    /// `OSInstall` entry of `ExtendedMetaInfo.InstallAssistantPackageIdentifiers`.
    pub os_install_identifier: Option<String>,
}

impl Product {
    /// Whether this product is a full OS installer.
    pub fn is_os_installer(&self) -> bool {
        self.os_install_identifier.as_deref() == Some(OS_INSTALL_IDENTIFIER)
    }

    /// The English distribution document URL, if any.
    pub fn distribution_url(&self) -> Option<&str> {
        DISTRIBUTION_LOCALES
            .iter()
            .find_map(|locale| self.distributions.get(*locale))
            .map(String::as_str)
    }

    /// Sum of the sizes of every package that has a URL.
    pub fn total_size(&self) -> u64 {
        self.packages
            .iter()
            .filter(|p| p.url.is_some())
            .map(|p| p.size)
            .sum()
    }
}

/// One downloadable file of a product.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Package {
    /// Payload URL.
    pub url: Option<String>,
    /// Metadata sidecar URL.
    pub metadata_url: Option<String>,
    /// Declared size in bytes; 0 when absent.
    pub size: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawCatalog {
    // Decoded per product so one malformed entry does not sink the catalog.
    #[serde(rename = "Products", default)]
    products: BTreeMap<String, plist::Value>,
}

#[derive(Debug, Deserialize)]
struct RawProduct {
    #[serde(rename = "PostDate")]
    post_date: Option<plist::Date>,
    #[serde(rename = "Packages", default)]
    packages: Vec<RawPackage>,
    #[serde(rename = "Distributions", default)]
    distributions: BTreeMap<String, plist::Value>,
    #[serde(rename = "ServerMetadataURL")]
    server_metadata_url: Option<String>,
    #[serde(rename = "ExtendedMetaInfo")]
    extended_meta_info: Option<plist::Value>,
}

#[derive(Debug, Deserialize)]
struct RawPackage {
    #[serde(rename = "URL")]
    url: Option<String>,
    #[serde(rename = "MetadataURL")]
    metadata_url: Option<String>,
    #[serde(rename = "Size")]
    size: Option<plist::Value>,
}

impl From<RawCatalog> for Catalog {
    fn from(raw: RawCatalog) -> Self {
        let products = raw
            .products
            .into_iter()
            .filter_map(|(id, value)| match plist::from_value::<RawProduct>(&value) {
                Ok(product) => {
                    let product = product.into_product(id.clone());
                    Some((id, product))
                }
                Err(e) => {
                    warn!(product = %id, error = %e, "Skipping malformed catalog product");
                    None
                }
            })
            .collect();
        Catalog { products }
    }
}

impl RawProduct {
    fn into_product(self, id: String) -> Product {
        let os_install_identifier = self
            .extended_meta_info
            .as_ref()
            .and_then(|info| info.as_dictionary())
            .and_then(|info| info.get("InstallAssistantPackageIdentifiers"))
            .and_then(|ids| ids.as_dictionary())
            .and_then(|ids| ids.get("OSInstall"))
            .and_then(|id| id.as_string())
            .map(str::to_string);

        let distributions = self
            .distributions
            .into_iter()
            .filter_map(|(locale, url)| url.into_string().map(|url| (locale, url)))
            .collect();

        Product {
            id,
            post_date: self.post_date.map(|d| DateTime::<Utc>::from(SystemTime::from(d))),
            packages: self.packages.into_iter().map(Package::from).collect(),
            distributions,
            server_metadata_url: self.server_metadata_url,
            os_install_identifier,
        }
    }
}

impl From<RawPackage> for Package {
    fn from(raw: RawPackage) -> Self {
        // Sizes are integers in practice; anything else counts as unsized.
        let size = match raw.size {
            Some(plist::Value::Integer(n)) => n.as_unsigned().unwrap_or(0),
            Some(plist::Value::Real(r)) if r > 0.0 => r as u64,
            _ => 0,
        };
        Package {
            url: raw.url,
            metadata_url: raw.metadata_url,
            size,
        }
    }
}
