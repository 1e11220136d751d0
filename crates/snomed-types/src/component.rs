//! Terminology components as stored on a branch.
//!
//! A [`Component`] is the unit of branch content: a concept, description,
//! relationship or reference set member. Two components are duplicates only
//! when every field is equal, which is what branch rebasing relies on.

use std::collections::BTreeMap;

/// A SNOMED CT identifier (SCTID).
///
/// SCTIDs are 64-bit unsigned integers that uniquely identify components
/// within SNOMED CT.
pub type SctId = u64;

/// The kind of a terminology component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentKind {
    /// A concept.
    Concept,
    /// A description (FSN, synonym or text definition).
    Description,
    /// A stated or inferred relationship.
    Relationship,
    /// A reference set member (language, association, OWL axiom, ...).
    ReferenceSetMember,
}

/// A component of branch content.
///
/// Component ids are strings so that both SCTIDs and the UUIDs used by
/// reference set members fit. Type specific fields such as `conceptId`,
/// `refsetId` or `owlExpression` live in `properties`.
///
/// # Examples
///
/// ```
/// use snomed_types::{Component, ComponentKind};
///
/// let concept = Component::new("404684003", ComponentKind::Concept, 900000000000207008);
/// let mut edited = concept.clone();
/// edited.active = false;
///
/// // Same id, different state: not a duplicate.
/// assert_eq!(concept.id, edited.id);
/// assert_ne!(concept, edited);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Component {
    /// Component identifier.
    pub id: String,
    /// What sort of component this is.
    pub kind: ComponentKind,
    /// Whether this component is active.
    pub active: bool,
    /// The module owning this component.
    pub module_id: SctId,
    /// Effective date in YYYYMMDD format, `None` while unpublished.
    #[cfg_attr(feature = "serde", serde(default))]
    pub effective_time: Option<u32>,
    /// Whether this state has been part of a release.
    #[cfg_attr(feature = "serde", serde(default))]
    pub released: bool,
    /// Type specific fields, keyed by RF2 column name.
    #[cfg_attr(feature = "serde", serde(default))]
    pub properties: BTreeMap<String, String>,
}

impl Component {
    /// Creates an active, unpublished component with no properties.
    pub fn new(id: impl Into<String>, kind: ComponentKind, module_id: SctId) -> Self {
        Self {
            id: id.into(),
            kind,
            active: true,
            module_id,
            effective_time: None,
            released: false,
            properties: BTreeMap::new(),
        }
    }

    /// Builder style helper that sets a property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Returns a property value.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Ids of other components this one points at.
    pub fn references(&self) -> impl Iterator<Item = &str> {
        crate::well_known::REFERENCE_PROPERTIES
            .iter()
            .filter_map(move |key| self.property(key))
    }

    /// Returns an inactivated copy, marked unpublished.
    pub fn inactivated(&self) -> Self {
        Self {
            active: false,
            effective_time: None,
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::well_known;

    #[test]
    fn test_references_follow_reference_properties() {
        let relationship = Component::new("1001", ComponentKind::Relationship, 1)
            .with_property(well_known::SOURCE_ID, "100")
            .with_property(well_known::DESTINATION_ID, "200")
            .with_property(well_known::TYPE_ID, "116680003")
            .with_property("relationshipGroup", "0");

        let mut refs: Vec<&str> = relationship.references().collect();
        refs.sort();
        assert_eq!(refs, vec!["100", "116680003", "200"]);
    }

    #[test]
    fn test_inactivated_clears_effective_time() {
        let mut concept = Component::new("100", ComponentKind::Concept, 1);
        concept.effective_time = Some(20240101);
        concept.released = true;

        let inactive = concept.inactivated();
        assert!(!inactive.active);
        assert_eq!(inactive.effective_time, None);
        assert!(inactive.released);
        assert_ne!(concept, inactive);
    }
}
