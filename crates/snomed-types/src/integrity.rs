//! Referential integrity reports.

use std::collections::BTreeMap;

/// Components whose references are still broken after a structural branch
/// operation.
///
/// Keys are the ids of the offending components; values are the ids they
/// reference that cannot be resolved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntegrityIssueReport {
    /// Broken references by offending component id.
    pub broken_references: BTreeMap<String, Vec<String>>,
}

impl IntegrityIssueReport {
    /// Records that `component_id` references the unresolved `missing_id`.
    pub fn add(&mut self, component_id: impl Into<String>, missing_id: impl Into<String>) {
        self.broken_references
            .entry(component_id.into())
            .or_default()
            .push(missing_id.into());
    }

    /// Returns true if no broken references were found.
    pub fn is_empty(&self) -> bool {
        self.broken_references.is_empty()
    }

    /// Number of components with broken references.
    pub fn len(&self) -> usize {
        self.broken_references.len()
    }
}
