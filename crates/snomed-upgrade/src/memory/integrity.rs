//! Referential integrity check over in-memory branch content.

use std::collections::BTreeMap;

use snomed_types::{Branch, Component, IntegrityIssueReport};
use tracing::debug;

use crate::collaborators::IntegrityCheck;
use crate::error::CollaboratorResult;

use super::InMemoryTerminologyStore;

/// Reports active `changed` components referencing a component that is
/// missing or inactive in `visible`.
pub fn unresolved_references<'a, I>(changed: I, visible: &BTreeMap<String, Component>) -> IntegrityIssueReport
where
    I: IntoIterator<Item = &'a Component>,
{
    let mut report = IntegrityIssueReport::default();
    for component in changed.into_iter().filter(|c| c.active) {
        for reference in component.references() {
            if !visible.get(reference).is_some_and(|target| target.active) {
                report.add(component.id.as_str(), reference);
            }
        }
    }
    report
}

impl IntegrityCheck for InMemoryTerminologyStore {
    fn find_unresolved_integrity_issues(&self, branch: &Branch) -> CollaboratorResult<IntegrityIssueReport> {
        let state = self.read();
        let (own, visible) = state.own_and_visible(&branch.path)?;
        let report = unresolved_references(own.values(), &visible);
        debug!(
            "Integrity check of {}: {} changed components, {} with broken references",
            branch.path,
            own.len(),
            report.len()
        );
        Ok(report)
    }
}
