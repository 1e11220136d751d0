//! Well-known SNOMED CT identifiers, component property names and branch
//! metadata keys.
//!
//! # Examples
//!
//! ```
//! use snomed_types::well_known;
//!
//! assert_eq!(well_known::OWL_AXIOM_REFSET, 733073007);
//! assert_eq!(well_known::DEPENDENCY_PACKAGE, "dependencyPackage");
//! ```

use crate::SctId;

// =============================================================================
// Modules
// =============================================================================

/// SNOMED CT core module (900000000000207008).
pub const SNOMED_CT_CORE_MODULE: SctId = 900000000000207008;

// =============================================================================
// Reference Sets
// =============================================================================

/// Description inactivation indicator reference set (900000000000490003).
pub const DESCRIPTION_INACTIVATION_INDICATOR_REFSET: SctId = 900000000000490003;

/// OWL axiom reference set (733073007).
///
/// Holds the stated axioms of every concept. Members other than the one
/// authored with the concept are the "additional" axioms.
pub const OWL_AXIOM_REFSET: SctId = 733073007;

/// US English language reference set (900000000000509007).
pub const US_ENGLISH_LANGUAGE_REFSET: SctId = 900000000000509007;

/// GB English language reference set (900000000000508004).
pub const GB_ENGLISH_LANGUAGE_REFSET: SctId = 900000000000508004;

// =============================================================================
// Values
// =============================================================================

/// Concept non-current (900000000000495008).
///
/// Inactivation reason recorded on descriptions that remain active on an
/// inactive concept.
pub const CONCEPT_NON_CURRENT: SctId = 900000000000495008;

/// Preferred acceptability (900000000000548007).
pub const PREFERRED: SctId = 900000000000548007;

/// Acceptable acceptability (900000000000549004).
pub const ACCEPTABLE: SctId = 900000000000549004;

// =============================================================================
// Component Properties
// =============================================================================

/// Concept a description belongs to.
pub const CONCEPT_ID: &str = "conceptId";
/// Source concept of a relationship.
pub const SOURCE_ID: &str = "sourceId";
/// Destination concept of a relationship.
pub const DESTINATION_ID: &str = "destinationId";
/// Attribute type of a relationship or description type.
pub const TYPE_ID: &str = "typeId";
/// Reference set a member belongs to.
pub const REFSET_ID: &str = "refsetId";
/// Component a reference set member points at.
pub const REFERENCED_COMPONENT_ID: &str = "referencedComponentId";
/// Value of an attribute-value reference set member.
pub const VALUE_ID: &str = "valueId";
/// Acceptability of a language reference set member.
pub const ACCEPTABILITY_ID: &str = "acceptabilityId";
/// OWL expression of an axiom member.
pub const OWL_EXPRESSION: &str = "owlExpression";

/// Properties that point at another component and must resolve for the
/// branch to have referential integrity.
pub const REFERENCE_PROPERTIES: &[&str] = &[
    CONCEPT_ID,
    SOURCE_ID,
    DESTINATION_ID,
    TYPE_ID,
    REFERENCED_COMPONENT_ID,
];

// =============================================================================
// Branch Metadata Keys
// =============================================================================

/// Release package of the parent release most recently adopted.
pub const DEPENDENCY_PACKAGE: &str = "dependencyPackage";

/// Value `dependencyPackage` held before the last upgrade.
pub const PREVIOUS_DEPENDENCY_PACKAGE: &str = "previousDependencyPackage";

/// Effective date of the parent release most recently adopted.
pub const DEPENDENCY_RELEASE: &str = "dependencyRelease";

/// Nested map of server managed metadata.
pub const INTERNAL_METADATA_KEY: &str = "internal";

/// Key inside [`INTERNAL_METADATA_KEY`] flagging unresolved integrity issues.
pub const INTEGRITY_ISSUE_METADATA_KEY: &str = "integrityIssue";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_properties_exclude_refset_id() {
        assert!(!REFERENCE_PROPERTIES.contains(&REFSET_ID));
        assert!(REFERENCE_PROPERTIES.contains(&REFERENCED_COMPONENT_ID));
    }

    #[test]
    fn test_language_refsets_distinct() {
        assert_ne!(US_ENGLISH_LANGUAGE_REFSET, GB_ENGLISH_LANGUAGE_REFSET);
    }
}
