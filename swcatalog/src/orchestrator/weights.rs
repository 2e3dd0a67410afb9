//! Splitting the product weight across packages.

use crate::catalog::Package;

/// Overall-progress weight of each package, in order.
///
/// Each package with a URL and a non-zero size gets
/// `size / total * product_fraction`; every other package gets 0 and does
/// not count towards `total`.
pub fn package_weights(packages: &[Package], product_fraction: f64) -> Vec<f64> {
    let participates = |p: &Package| p.url.is_some() && p.size > 0;

    let total: u64 = packages
        .iter()
        .filter(|p| participates(p))
        .map(|p| p.size)
        .sum();

    packages
        .iter()
        .map(|p| {
            if total == 0 || !participates(p) {
                0.0
            } else {
                p.size as f64 / total as f64 * product_fraction
            }
        })
        .collect()
}
