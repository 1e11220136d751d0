//! # snomed-types
//!
//! Type definitions for versioned SNOMED CT content.
//!
//! This crate provides the data model shared by the upgrade orchestration
//! crates: code systems and their published versions, branches with their
//! metadata, point-in-time branch locators, branch content components and
//! upgrade jobs.
//!
//! ## Features
//!
//! - `serde` (default): Enables serialization/deserialization support via serde.
//!
//! ## Usage
//!
//! ```rust
//! use snomed_types::{parent_path, BranchTimepoint, CodeSystem, CodeSystemVersion};
//!
//! let international = CodeSystem::new("SNOMEDCT", "MAIN");
//! let extension = CodeSystem::new("SNOMEDCT-A", "MAIN/SNOMEDCT-A");
//! assert_eq!(parent_path(&extension.branch_path), Some("MAIN"));
//!
//! let release = CodeSystemVersion::new(&international, 20250101, "2025-01-01")
//!     .with_release_package("SnomedCT_Release_INT_20250101");
//! assert_eq!(release.branch_path, "MAIN/2025-01-01");
//!
//! let creation = BranchTimepoint::parse(&extension.branch_path, Some("-")).unwrap();
//! assert!(creation.is_branch_creation_timepoint());
//! ```

#![warn(missing_docs)]

mod branch;
mod code_system;
mod component;
mod integrity;
mod job;
mod timepoint;
pub mod well_known;

// Re-export all public types at crate root
pub use branch::{is_same_or_descendant, parent_path, Branch, Metadata, MetadataValue};
pub use code_system::{version_branch_path, CodeSystem, CodeSystemVersion};
pub use component::{Component, ComponentKind, SctId};
pub use integrity::IntegrityIssueReport;
pub use job::{JobId, UpgradeJob, UpgradeStatus};
pub use timepoint::{
    BranchTimepoint, MalformedTimepoint, Timepoint, BRANCH_CREATION_TIMEPOINT, DATE_FORMAT_STRING,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_types_are_exported() {
        // Verify all types are accessible from crate root
        let _id: SctId = 73211009;
        let _kind = ComponentKind::Concept;
        let _status = UpgradeStatus::Running;
        let _metadata = Metadata::default();
        let _report = IntegrityIssueReport::default();
        let _timepoint = Timepoint::Head;
    }

    #[test]
    fn test_well_known_accessible() {
        assert_eq!(well_known::DEPENDENCY_RELEASE, "dependencyRelease");
        assert_eq!(well_known::CONCEPT_NON_CURRENT, 900000000000495008);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_serde_roundtrip() {
        let code_system = CodeSystem {
            short_name: "SNOMEDCT-A".to_string(),
            branch_path: "MAIN/SNOMEDCT-A".to_string(),
            daily_build_available: true,
        };

        let json = serde_json::to_string(&code_system).unwrap();
        let parsed: CodeSystem = serde_json::from_str(&json).unwrap();
        assert_eq!(code_system, parsed);
    }
}
