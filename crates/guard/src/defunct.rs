//! Installed packages no repository offers any more

use pkgcruft_types::PackageId;
use std::collections::{BTreeSet, HashSet};

/// `local − remote`, sorted and without duplicates
///
/// Identifiers compare as whole `name-version` strings, so an installed
/// version the repository has since replaced counts as defunct.
pub fn defunct_packages(local: &[PackageId], remote: &[PackageId]) -> Vec<PackageId> {
    let remote: HashSet<&PackageId> = remote.iter().collect();
    local
        .iter()
        .filter(|id| !remote.contains(id))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
