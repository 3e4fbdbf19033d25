//! Listing score of an indexed package.

use crate::types::Package;

/// Score fixed when a package is stored:
/// - 3: standard library (no project root)
/// - 2: documented package
/// - 1: package without a synopsis
/// - 0: package built with errors
pub(crate) fn package_score(pkg: &Package) -> f32 {
    if pkg.project_root.is_empty() {
        3.0
    } else if !pkg.errors.is_empty() {
        0.0
    } else if pkg.synopsis.is_empty() {
        1.0
    } else {
        2.0
    }
}
