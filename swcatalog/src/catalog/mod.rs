//! Root software update catalog.
//!
//! The catalog is a property list (optionally gzip-compressed) mapping
//! product ids to products. [`CatalogStore`] downloads it, decodes it into
//! [`Catalog`], and [`find_installer_products`] picks out the full OS
//! installers.

mod error;
mod store;
mod types;

pub use error::CatalogError;
pub use store::{find_installer_products, parse_catalog, parse_catalog_file, CatalogStore};
pub use types::{Catalog, Package, Product, OS_INSTALL_IDENTIFIER};

#[cfg(test)]
pub(crate) use store::fixtures;
