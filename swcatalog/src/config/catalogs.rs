//! Known software update catalog endpoints.

/// Catalog URLs keyed by Darwin major version (`uname -r`).
///
/// Each catalog is a superset of the previous one, so a host always gets the
/// newest catalog it can install from.
pub const DEFAULT_CATALOGS: &[(u32, &str)] = &[
    (
        17,
        "https://swscan.apple.com/content/catalogs/others/\
         index-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
    (
        18,
        "https://swscan.apple.com/content/catalogs/others/\
         index-10.14-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
    (
        19,
        "https://swscan.apple.com/content/catalogs/others/\
         index-10.15-10.14-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
    (
        20,
        "https://swscan.apple.com/content/catalogs/others/\
         index-10.16-10.15-10.14-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
    (
        21,
        "https://swscan.apple.com/content/catalogs/others/\
         index-12-10.16-10.15-10.14-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
    (
        22,
        "https://swscan.apple.com/content/catalogs/others/\
         index-13-12-10.16-10.15-10.14-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
    (
        23,
        "https://swscan.apple.com/content/catalogs/others/\
         index-14-13-12-10.16-10.15-10.14-10.13-10.12-10.11-10.10-10.9\
         -mountainlion-lion-snowleopard-leopard.merged-1.sucatalog",
    ),
];

/// Look up the default catalog for a Darwin major version.
pub fn default_catalog_url(darwin_major: u32) -> Option<&'static str> {
    DEFAULT_CATALOGS
        .iter()
        .find(|(major, _)| *major == darwin_major)
        .map(|(_, url)| *url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_version() {
        let url = default_catalog_url(19).unwrap();
        assert!(url.starts_with("https://swscan.apple.com/"));
        assert!(url.contains("index-10.15-10.14"));
        assert!(url.ends_with(".merged-1.sucatalog"));
        assert!(!url.contains(' '));
    }

    #[test]
    fn test_unknown_version_has_no_fallback() {
        assert!(default_catalog_url(16).is_none());
        assert!(default_catalog_url(99).is_none());
    }
}
