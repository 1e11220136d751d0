//! Dependency lineage recorded in extension branch metadata.
//!
//! After an upgrade the extension branch records which parent release it now
//! depends on and which package it depended on before.

use snomed_types::well_known::{
    DEPENDENCY_PACKAGE, DEPENDENCY_RELEASE, INTEGRITY_ISSUE_METADATA_KEY, INTERNAL_METADATA_KEY,
    PREVIOUS_DEPENDENCY_PACKAGE,
};
use snomed_types::{CodeSystemVersion, IntegrityIssueReport, Metadata};
use tracing::{error, info, warn};

/// Records adoption of `new_parent_version` in `metadata`.
///
/// - `dependencyPackage` becomes the version's release package and
///   `previousDependencyPackage` the value it replaced. A version without a
///   release package leaves both untouched.
/// - `dependencyRelease` becomes the version's effective date.
/// - A non-empty `report` sets `internal.integrityIssue`; an empty report
///   leaves the internal metadata alone.
pub fn record_adopted_release(
    metadata: &mut Metadata,
    branch_path: &str,
    new_parent_version: &CodeSystemVersion,
    report: &IntegrityIssueReport,
) {
    let previous_dependency_package = metadata.get_string(DEPENDENCY_PACKAGE).map(str::to_owned);

    match &new_parent_version.release_package {
        Some(package) => {
            metadata.put_string(DEPENDENCY_PACKAGE, package.as_str());
            match previous_dependency_package {
                Some(previous) => metadata.put_string(PREVIOUS_DEPENDENCY_PACKAGE, previous),
                None => {
                    metadata.remove(PREVIOUS_DEPENDENCY_PACKAGE);
                }
            }
        }
        None => error!("No release package is set for version {}", new_parent_version),
    }

    metadata.put_string(
        DEPENDENCY_RELEASE,
        new_parent_version.effective_date.to_string(),
    );

    if report.is_empty() {
        info!("No issues found in the integrity issue report.");
    } else {
        warn!(
            "Bad integrity found on {}: {} components",
            branch_path,
            report.len()
        );
        metadata
            .get_map_or_create(INTERNAL_METADATA_KEY)
            .insert(INTEGRITY_ISSUE_METADATA_KEY.to_string(), "true".to_string());
    }
}

/// Returns true if `metadata` carries the unresolved integrity flag.
pub fn has_integrity_issue(metadata: &Metadata) -> bool {
    metadata
        .get_map(INTERNAL_METADATA_KEY)
        .and_then(|internal| internal.get(INTEGRITY_ISSUE_METADATA_KEY))
        .is_some_and(|flag| flag == "true")
}
